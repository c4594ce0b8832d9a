//! Per-step reward judgement.
//!
//! Scoring is a pure function of the latest snapshot plus a small amount of
//! episode-local state (which trash objects have already been credited).
//! Utensils are assigned to the left zone and books to the right; generic
//! items never score.

use std::collections::HashSet;

use bevy::prelude::Resource;

use deskbot_core::bounds::{DeskBounds, Zone};
use deskbot_core::config::RewardConfig;
use deskbot_core::types::{GripperPose, ObjectGroup, ObjectId, ObjectState, StepInfo};

/// Outcome of judging one step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Judgement {
    pub reward: f32,
    /// The episode should terminate (success or gripper loss).
    pub terminal: bool,
    pub info: StepInfo,
}

/// Zone an object group is expected to end up in, if any.
#[must_use]
pub fn assigned_zone(group: ObjectGroup) -> Option<Zone> {
    match group {
        ObjectGroup::Utensils => Some(Zone::Left),
        ObjectGroup::Books => Some(Zone::Right),
        ObjectGroup::Trash | ObjectGroup::Items => None,
    }
}

#[derive(Resource, Debug)]
pub struct RewardModel {
    config: RewardConfig,
    zone_inset: f32,
    /// Trash credited as removed; the bonus is paid once per object even if
    /// it keeps falling for many steps.
    credited_trash: HashSet<ObjectId>,
}

impl RewardModel {
    #[must_use]
    pub fn new(config: RewardConfig, zone_inset: f32) -> Self {
        Self {
            config,
            zone_inset,
            credited_trash: HashSet::new(),
        }
    }

    /// Forget per-episode credit state.
    pub fn reset(&mut self) {
        self.credited_trash.clear();
    }

    /// Score one step from a fresh snapshot.
    ///
    /// An object that is neither on the desk nor settled below it (e.g. held
    /// beside the desk at surface height) scores nothing this step.
    pub fn judge(
        &mut self,
        objects: &[ObjectState],
        gripper: &GripperPose,
        bounds: &DeskBounds,
    ) -> Judgement {
        let mut reward = self.config.step_penalty;
        let mut info = StepInfo::default();

        if gripper.pos().y < bounds.min_y {
            reward += self.config.gripper_fell;
            info.fell_off = true;
            return Judgement {
                reward,
                terminal: true,
                info,
            };
        }

        let mut trash_total = 0u32;
        let mut trash_off = 0u32;
        let mut scored_objects = 0u32;

        for state in objects {
            let p = state.pos();
            match state.group {
                ObjectGroup::Trash => {
                    trash_total += 1;
                    scored_objects += 1;
                    if bounds.is_off_desk(p) {
                        trash_off += 1;
                        if self.credited_trash.insert(state.id) {
                            reward += self.config.trash_removed;
                        }
                    } else if bounds.is_on_desk(p) {
                        info.trash_on_desk += 1;
                    }
                }
                ObjectGroup::Utensils | ObjectGroup::Books => {
                    scored_objects += 1;
                    let (in_zone, total) = if state.group == ObjectGroup::Utensils {
                        (&mut info.utensils_in_zone, &mut info.utensils_total)
                    } else {
                        (&mut info.books_in_zone, &mut info.books_total)
                    };
                    *total += 1;

                    let Some(zone) = assigned_zone(state.group) else {
                        continue;
                    };
                    if bounds.is_on_desk(p) {
                        if bounds.zone_contains(zone, p, self.zone_inset) {
                            *in_zone += 1;
                            reward += self.config.in_zone;
                        } else {
                            reward += self.config.wrong_zone;
                        }
                    } else if bounds.is_off_desk(p) {
                        reward += self.config.item_fell;
                    }
                }
                ObjectGroup::Items => {}
            }
        }

        let success = scored_objects > 0
            && trash_off == trash_total
            && info.utensils_in_zone == info.utensils_total
            && info.books_in_zone == info.books_total;
        if success {
            reward += self.config.success_bonus;
            info.success = true;
        }

        Judgement {
            reward,
            terminal: success,
            info,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;
    use deskbot_core::types::{ColorTag, ObjectKind};

    fn desk() -> DeskBounds {
        DeskBounds::from_corners(Vec3::new(-0.6, 0.275, -0.4), Vec3::new(0.6, 1.275, 0.4))
    }

    fn object(id: u64, kind: ObjectKind, pos: Vec3) -> ObjectState {
        ObjectState {
            id: ObjectId(id),
            kind,
            group: kind.default_group(),
            color: ColorTag::Neutral,
            position: pos.to_array(),
            velocity: [0.0; 3],
            is_moving: false,
        }
    }

    fn gripper_at(pos: Vec3) -> GripperPose {
        GripperPose {
            position: pos.to_array(),
            grasping: false,
        }
    }

    fn model() -> RewardModel {
        RewardModel::new(RewardConfig::default(), 0.08)
    }

    #[test]
    fn generic_items_only_pay_the_step_penalty() {
        let mut model = model();
        let bounds = desk();
        let objects = vec![object(0, ObjectKind::Generic, Vec3::new(0.0, 0.8, 0.0))];
        let j = model.judge(&objects, &gripper_at(Vec3::new(0.0, 1.2, 0.0)), &bounds);
        assert!((j.reward - (-1.0)).abs() < 1e-5);
        assert!(!j.terminal);
        assert!(!j.info.success);
    }

    #[test]
    fn trash_removal_credited_exactly_once() {
        let mut model = model();
        let bounds = desk();
        let on_desk = vec![object(0, ObjectKind::Trash, Vec3::new(0.0, 0.8, 0.0))];
        let grip = gripper_at(Vec3::new(0.0, 1.2, 0.0));

        let before = model.judge(&on_desk, &grip, &bounds);
        assert_eq!(before.info.trash_on_desk, 1);
        assert!((before.reward - (-1.0)).abs() < 1e-5);

        // The removal tick pays the credit on top of the step penalty.
        let off_desk = vec![object(0, ObjectKind::Trash, Vec3::new(1.2, 0.05, 0.0))];
        let removal = model.judge(&off_desk, &grip, &bounds);
        assert!(removal.reward - before.reward >= 100.0);

        // Later ticks do not pay it again, but success keeps holding.
        let after = model.judge(&off_desk, &grip, &bounds);
        assert!(after.reward < removal.reward - 99.0);
    }

    #[test]
    fn removed_trash_alone_is_success() {
        let mut model = model();
        let bounds = desk();
        let objects = vec![object(0, ObjectKind::Trash, Vec3::new(1.2, 0.05, 0.0))];
        let j = model.judge(&objects, &gripper_at(Vec3::new(0.0, 1.2, 0.0)), &bounds);
        assert!(j.info.success);
        assert!(j.terminal);
        // step penalty + removal credit + success bonus
        assert!((j.reward - (-1.0 + 100.0 + 500.0)).abs() < 1e-4);
    }

    #[test]
    fn gripper_below_band_is_terminal() {
        let mut model = model();
        let bounds = desk();
        let objects = vec![object(0, ObjectKind::Trash, Vec3::new(0.0, 0.8, 0.0))];
        let j = model.judge(&objects, &gripper_at(Vec3::new(0.0, 0.1, 0.0)), &bounds);
        assert!(j.terminal);
        assert!(j.info.fell_off);
        assert!((j.reward - (-1.0 - 200.0)).abs() < 1e-4);
    }

    #[test]
    fn items_in_assigned_zones_score_and_succeed() {
        let mut model = model();
        let bounds = desk();
        let y = bounds.surface_y() + 0.02;
        let utensil_pos = bounds.zone_anchor(Zone::Left, 0.08).with_y(y);
        let book_pos = bounds.zone_anchor(Zone::Right, 0.08).with_y(y);
        let objects = vec![
            object(0, ObjectKind::Utensil, utensil_pos),
            object(1, ObjectKind::Book, book_pos),
        ];
        let j = model.judge(&objects, &gripper_at(Vec3::new(0.0, 1.2, 0.0)), &bounds);
        assert_eq!(j.info.utensils_in_zone, 1);
        assert_eq!(j.info.books_in_zone, 1);
        assert!(j.info.success);
        assert!((j.reward - (-1.0 + 50.0 + 50.0 + 500.0)).abs() < 1e-4);
    }

    #[test]
    fn item_outside_its_zone_is_penalized() {
        let mut model = model();
        let bounds = desk();
        let objects = vec![object(0, ObjectKind::Utensil, Vec3::new(0.0, 0.8, 0.0))];
        let j = model.judge(&objects, &gripper_at(Vec3::new(0.0, 1.2, 0.0)), &bounds);
        assert_eq!(j.info.utensils_in_zone, 0);
        assert_eq!(j.info.utensils_total, 1);
        assert!(!j.info.success);
        assert!((j.reward - (-1.0 - 10.0)).abs() < 1e-4);
    }

    #[test]
    fn fallen_item_is_penalized_every_step() {
        let mut model = model();
        let bounds = desk();
        let objects = vec![object(0, ObjectKind::Book, Vec3::new(1.5, 0.05, 0.0))];
        let first = model.judge(&objects, &gripper_at(Vec3::new(0.0, 1.2, 0.0)), &bounds);
        let second = model.judge(&objects, &gripper_at(Vec3::new(0.0, 1.2, 0.0)), &bounds);
        assert!((first.reward - (-1.0 - 50.0)).abs() < 1e-4);
        assert!((second.reward - first.reward).abs() < 1e-5);
    }

    #[test]
    fn object_beside_desk_at_surface_height_scores_nothing() {
        let mut model = model();
        let bounds = desk();
        // Mid-carry past the edge: not on the desk, not fallen below it.
        let objects = vec![object(0, ObjectKind::Trash, Vec3::new(0.9, 0.8, 0.0))];
        let j = model.judge(&objects, &gripper_at(Vec3::new(0.9, 0.9, 0.0)), &bounds);
        assert!((j.reward - (-1.0)).abs() < 1e-5);
        assert_eq!(j.info.trash_on_desk, 0);
        assert!(!j.info.success);
    }

    #[test]
    fn empty_scene_never_succeeds() {
        let mut model = model();
        let bounds = desk();
        let j = model.judge(&[], &gripper_at(Vec3::new(0.0, 1.2, 0.0)), &bounds);
        assert!(!j.info.success);
        assert!(!j.terminal);
    }

    #[test]
    fn reset_forgets_trash_credit() {
        let mut model = model();
        let bounds = desk();
        let off = vec![object(0, ObjectKind::Trash, Vec3::new(1.2, 0.05, 0.0))];
        let grip = gripper_at(Vec3::new(0.0, 1.2, 0.0));
        let first = model.judge(&off, &grip, &bounds);
        model.reset();
        let again = model.judge(&off, &grip, &bounds);
        assert!((again.reward - first.reward).abs() < 1e-5);
    }
}
