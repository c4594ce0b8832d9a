//! Intent-to-plan compilation.
//!
//! A plan is an ordered queue of pick-and-place tasks built from a snapshot
//! of the scene at compile time. Targets are pure geometry derived from the
//! desk bounds; the executor re-validates object ids as it consumes tasks.

use std::collections::{BTreeMap, VecDeque};

use bevy::prelude::Vec3;

use deskbot_core::bounds::{DeskBounds, Zone};
use deskbot_core::types::{ColorTag, ObjectGroup, ObjectId, ObjectState};

use crate::command::Intent;

/// Spacing between drop points for trash tossed off the table.
const DROP_SPACING: f32 = 0.25;
/// Cell size of organize grids.
const GRID_SPACING: f32 = 0.12;
/// Spacing along placement lines.
const LINE_SPACING: f32 = 0.15;
/// Placement height above the surface.
const PLACE_CLEARANCE: f32 = 0.05;

/// One pick-and-place unit of work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickPlaceTask {
    pub object: ObjectId,
    pub target: Vec3,
}

/// Ordered task queue, consumed front-to-back and never reordered.
#[derive(Debug, Clone, Default)]
pub struct TaskPlan {
    tasks: VecDeque<PickPlaceTask>,
}

impl TaskPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[must_use]
    pub fn front(&self) -> Option<&PickPlaceTask> {
        self.tasks.front()
    }

    pub fn pop_front(&mut self) -> Option<PickPlaceTask> {
        self.tasks.pop_front()
    }

    pub fn push_back(&mut self, task: PickPlaceTask) {
        self.tasks.push_back(task);
    }

    /// Append another plan's tasks, preserving order.
    pub fn append(&mut self, mut other: Self) {
        self.tasks.append(&mut other.tasks);
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PickPlaceTask> {
        self.tasks.iter()
    }
}

impl From<Vec<PickPlaceTask>> for TaskPlan {
    fn from(tasks: Vec<PickPlaceTask>) -> Self {
        Self {
            tasks: tasks.into(),
        }
    }
}

/// Compile an intent against a scene snapshot.
#[must_use]
pub fn compile(
    intent: &Intent,
    snapshot: &[ObjectState],
    bounds: &DeskBounds,
    zone_inset: f32,
) -> TaskPlan {
    match *intent {
        Intent::CleanTable => clean_table(snapshot, bounds, zone_inset),
        Intent::OrganizeDesk => organize_desk(snapshot, bounds, zone_inset),
        Intent::OrganizeByColor => organize_by_color(snapshot, bounds, zone_inset),
        Intent::MoveGroup { group, zone } => move_group(snapshot, bounds, zone_inset, group, zone),
        Intent::GroupItems => group_items(snapshot, bounds, zone_inset),
        Intent::Unknown => TaskPlan::default(),
    }
}

/// On-desk trash to the off-table drop point, spread along Z so releases do
/// not stack.
fn clean_table(snapshot: &[ObjectState], bounds: &DeskBounds, zone_inset: f32) -> TaskPlan {
    let anchor = bounds.zone_anchor(Zone::OffTable, zone_inset);
    let mut plan = TaskPlan::default();
    let mut slot = 0;
    for state in snapshot {
        if state.group != ObjectGroup::Trash || !bounds.is_on_desk(state.pos()) {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let offset = Vec3::Z * (slot as f32 * DROP_SPACING);
        plan.push_back(PickPlaceTask {
            object: state.id,
            target: anchor + offset,
        });
        slot += 1;
    }
    plan
}

/// Utensils into a 3-column grid at the left zone, books into a 2-column
/// grid at the right zone. Off-desk items are left where they fell.
fn organize_desk(snapshot: &[ObjectState], bounds: &DeskBounds, zone_inset: f32) -> TaskPlan {
    let mut plan = TaskPlan::default();
    let mut place_grid = |group: ObjectGroup, zone: Zone, columns: usize| {
        let anchor = bounds.zone_anchor(zone, zone_inset);
        let mut slot = 0usize;
        for state in snapshot {
            if state.group != group || !bounds.is_on_desk(state.pos()) {
                continue;
            }
            let col = slot % columns;
            let row = slot / columns;
            #[allow(clippy::cast_precision_loss)]
            let offset = Vec3::new(
                (col as f32 - (columns as f32 - 1.0) * 0.5) * GRID_SPACING,
                PLACE_CLEARANCE,
                row as f32 * GRID_SPACING,
            );
            plan.push_back(PickPlaceTask {
                object: state.id,
                target: anchor + offset,
            });
            slot += 1;
        }
    };
    place_grid(ObjectGroup::Utensils, Zone::Left, 3);
    place_grid(ObjectGroup::Books, Zone::Right, 2);
    plan
}

/// Color clusters round-robined over left/right/corner, members along a
/// line. BTreeMap keeps the color-to-zone assignment deterministic.
fn organize_by_color(snapshot: &[ObjectState], bounds: &DeskBounds, zone_inset: f32) -> TaskPlan {
    const COLOR_ZONES: [Zone; 3] = [Zone::Left, Zone::Right, Zone::Corner];

    let mut by_color: BTreeMap<ColorTag, Vec<&ObjectState>> = BTreeMap::new();
    for state in snapshot {
        if bounds.is_on_desk(state.pos()) {
            by_color.entry(state.color).or_default().push(state);
        }
    }

    let mut plan = TaskPlan::default();
    for (cluster, (_, members)) in by_color.iter().enumerate() {
        let zone = COLOR_ZONES[cluster % COLOR_ZONES.len()];
        let anchor = bounds.zone_anchor(zone, zone_inset);
        for (i, state) in members.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let offset = Vec3::new(
                0.0,
                PLACE_CLEARANCE,
                (i as f32 - (members.len() as f32 - 1.0) * 0.5) * LINE_SPACING,
            );
            plan.push_back(PickPlaceTask {
                object: state.id,
                target: anchor + offset,
            });
        }
    }
    plan
}

/// Every member of the group to the zone, spread along a line.
fn move_group(
    snapshot: &[ObjectState],
    bounds: &DeskBounds,
    zone_inset: f32,
    group: ObjectGroup,
    zone: Zone,
) -> TaskPlan {
    let anchor = bounds.zone_anchor(zone, zone_inset);
    let members: Vec<&ObjectState> = snapshot
        .iter()
        .filter(|s| s.group == group || group == ObjectGroup::Items)
        .collect();
    let mut plan = TaskPlan::default();
    for (i, state) in members.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let offset = Vec3::new(
            0.0,
            PLACE_CLEARANCE,
            (i as f32 - (members.len() as f32 - 1.0) * 0.5) * LINE_SPACING,
        );
        plan.push_back(PickPlaceTask {
            object: state.id,
            target: anchor + offset,
        });
    }
    plan
}

/// Everything evenly around a circle at the center zone.
fn group_items(snapshot: &[ObjectState], bounds: &DeskBounds, zone_inset: f32) -> TaskPlan {
    let anchor = bounds.zone_anchor(Zone::Center, zone_inset);
    let radius = bounds.half_extents().min_element().min(0.25) * 0.8;
    let mut plan = TaskPlan::default();
    let count = snapshot.len();
    for (i, state) in snapshot.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let angle = std::f32::consts::TAU * i as f32 / count.max(1) as f32;
        let offset = Vec3::new(
            angle.cos() * radius,
            PLACE_CLEARANCE,
            angle.sin() * radius,
        );
        plan.push_back(PickPlaceTask {
            object: state.id,
            target: anchor + offset,
        });
    }
    plan
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
