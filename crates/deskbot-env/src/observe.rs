//! Observation building, desk-relative normalization, and flattening for
//! policies that want a plain feature vector.

use deskbot_core::bounds::DeskBounds;
use deskbot_core::types::{GripperPose, ObjectGroup, ObjectKind, Observation};
use deskbot_physics::PhysicsContext;
use deskbot_scene::ObjectRegistry;

/// Features per object in the flattened vector: position, velocity, kind
/// one-hot, group one-hot.
pub const FEATURES_PER_OBJECT: usize = 3 + 3 + ObjectKind::COUNT + ObjectGroup::COUNT;

/// Trailing features after the objects: gripper position, grasp flag, bounds.
pub const TAIL_FEATURES: usize = 3 + 1 + 6;

/// Length of the flattened vector for a given object count.
#[must_use]
pub const fn flat_len(object_count: usize) -> usize {
    object_count * FEATURES_PER_OBJECT + TAIL_FEATURES
}

/// Assemble a fresh observation from the live simulation state.
#[must_use]
pub fn build_observation(
    registry: &ObjectRegistry,
    physics: &PhysicsContext,
    gripper: GripperPose,
    bounds: DeskBounds,
) -> Observation {
    Observation {
        objects: registry.snapshot(physics),
        gripper,
        desk_bounds: bounds,
    }
}

/// Rescale the horizontal axes so the desk surface spans [-1, 1] regardless
/// of which world produced it. Heights and velocities stay in meters; a
/// policy reasoning about gravity should not have its vertical scale bent by
/// desk size.
///
/// A degenerate axis (zero half-extent) falls back to a plain offset.
#[must_use]
pub fn normalize(observation: &Observation) -> Observation {
    let b = observation.desk_bounds;
    let center = b.center();
    let half = b.half_extents();

    let map_axis = |v: f32, c: f32, h: f32| {
        if h > f32::EPSILON {
            (v - c) / h
        } else {
            v - c
        }
    };
    let map = |p: [f32; 3]| {
        [
            map_axis(p[0], center.x, half.x),
            p[1],
            map_axis(p[2], center.z, half.z),
        ]
    };

    let objects = observation
        .objects
        .iter()
        .map(|state| {
            let mut s = *state;
            s.position = map(s.position);
            s
        })
        .collect();

    let gripper = GripperPose {
        position: map(observation.gripper.position),
        grasping: observation.gripper.grasping,
    };

    let desk_bounds = DeskBounds {
        min_x: map_axis(b.min_x, center.x, half.x),
        max_x: map_axis(b.max_x, center.x, half.x),
        min_y: b.min_y,
        max_y: b.max_y,
        min_z: map_axis(b.min_z, center.z, half.z),
        max_z: map_axis(b.max_z, center.z, half.z),
    };

    Observation {
        objects,
        gripper,
        desk_bounds,
    }
}

/// Flatten to a fixed-layout feature vector. Object order follows the
/// registry's insertion order, which is stable within an episode.
#[must_use]
pub fn flatten(observation: &Observation) -> Vec<f32> {
    let mut out = Vec::with_capacity(flat_len(observation.objects.len()));

    for state in &observation.objects {
        out.extend_from_slice(&state.position);
        out.extend_from_slice(&state.velocity);

        let mut kind_one_hot = [0.0f32; ObjectKind::COUNT];
        kind_one_hot[state.kind.index()] = 1.0;
        out.extend_from_slice(&kind_one_hot);

        let mut group_one_hot = [0.0f32; ObjectGroup::COUNT];
        group_one_hot[state.group.index()] = 1.0;
        out.extend_from_slice(&group_one_hot);
    }

    out.extend_from_slice(&observation.gripper.position);
    out.push(if observation.gripper.grasping { 1.0 } else { 0.0 });

    let b = observation.desk_bounds;
    out.extend_from_slice(&[b.min_x, b.max_x, b.min_y, b.max_y, b.min_z, b.max_z]);

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;
    use deskbot_core::types::{ColorTag, ObjectId, ObjectState};

    fn state_at(pos: Vec3) -> ObjectState {
        ObjectState {
            id: ObjectId(0),
            kind: ObjectKind::Trash,
            group: ObjectGroup::Trash,
            color: ColorTag::Neutral,
            position: pos.to_array(),
            velocity: [0.1, -0.2, 0.3],
            is_moving: true,
        }
    }

    fn observation_on(bounds: DeskBounds, object_pos: Vec3, gripper_pos: Vec3) -> Observation {
        Observation {
            objects: vec![state_at(object_pos)],
            gripper: GripperPose {
                position: gripper_pos.to_array(),
                grasping: true,
            },
            desk_bounds: bounds,
        }
    }

    #[test]
    fn normalize_maps_desk_edges_to_unit_range() {
        let bounds =
            DeskBounds::from_corners(Vec3::new(-0.6, 0.275, -0.4), Vec3::new(0.6, 1.275, 0.4));
        let obs = observation_on(bounds, Vec3::new(0.6, 0.8, -0.4), Vec3::new(0.0, 1.2, 0.0));
        let n = normalize(&obs);

        let p = n.objects[0].position;
        assert!((p[0] - 1.0).abs() < 1e-5);
        assert!((p[2] - (-1.0)).abs() < 1e-5);
        // Height stays in meters.
        assert!((p[1] - 0.8).abs() < 1e-6);

        assert!((n.desk_bounds.min_x - (-1.0)).abs() < 1e-5);
        assert!((n.desk_bounds.max_x - 1.0).abs() < 1e-5);
        assert!((n.desk_bounds.min_y - 0.275).abs() < 1e-6);
        assert!((n.gripper.position[0]).abs() < 1e-5);
        assert!(n.gripper.grasping);
    }

    #[test]
    fn same_relative_pose_normalizes_identically_across_desks() {
        let small =
            DeskBounds::from_corners(Vec3::new(-0.5, 0.24, -0.38), Vec3::new(0.5, 1.24, 0.38));
        let large =
            DeskBounds::from_corners(Vec3::new(-0.6, 0.275, -0.4), Vec3::new(0.6, 1.275, 0.4));

        // Three quarters of the way toward +X, centered in Z, on each desk.
        let on_small = Vec3::new(0.25, 0.3, 0.0);
        let on_large = Vec3::new(0.3, 0.3, 0.0);
        let a = normalize(&observation_on(small, on_small, on_small));
        let b = normalize(&observation_on(large, on_large, on_large));

        assert!((a.objects[0].position[0] - b.objects[0].position[0]).abs() < 1e-5);
        assert!((a.objects[0].position[2] - b.objects[0].position[2]).abs() < 1e-5);
    }

    #[test]
    fn velocities_are_not_rescaled() {
        let bounds =
            DeskBounds::from_corners(Vec3::new(-0.6, 0.275, -0.4), Vec3::new(0.6, 1.275, 0.4));
        let obs = observation_on(bounds, Vec3::new(0.3, 0.8, 0.1), Vec3::ZERO);
        let n = normalize(&obs);
        assert_eq!(n.objects[0].velocity, obs.objects[0].velocity);
    }

    #[test]
    fn degenerate_axis_falls_back_to_offset() {
        let bounds = DeskBounds::from_corners(Vec3::new(0.2, 0.0, -0.4), Vec3::new(0.2, 1.0, 0.4));
        let obs = observation_on(bounds, Vec3::new(0.3, 0.5, 0.0), Vec3::ZERO);
        let n = normalize(&obs);
        let x = n.objects[0].position[0];
        assert!(x.is_finite());
        assert!((x - 0.1).abs() < 1e-5);
    }

    #[test]
    fn flatten_layout() {
        let bounds =
            DeskBounds::from_corners(Vec3::new(-0.6, 0.275, -0.4), Vec3::new(0.6, 1.275, 0.4));
        let obs = observation_on(bounds, Vec3::new(0.1, 0.8, 0.2), Vec3::new(0.0, 1.2, 0.0));
        let flat = flatten(&obs);
        assert_eq!(flat.len(), flat_len(1));

        // Object position leads.
        assert!((flat[0] - 0.1).abs() < 1e-6);
        // Kind one-hot: trash is index 2 of the kind block.
        let kind_block = &flat[6..6 + ObjectKind::COUNT];
        assert_eq!(kind_block.iter().filter(|v| **v == 1.0).count(), 1);
        assert!((kind_block[ObjectKind::Trash.index()] - 1.0).abs() < 1e-6);

        // Grasp flag sits after the gripper position.
        let tail = &flat[flat.len() - TAIL_FEATURES..];
        assert!((tail[3] - 1.0).abs() < 1e-6);
        // Bounds close the vector.
        assert!((tail[4] - bounds.min_x).abs() < 1e-6);
        assert!((tail[9] - bounds.max_z).abs() < 1e-6);
    }

    #[test]
    fn flatten_empty_scene_is_tail_only() {
        let bounds = DeskBounds::default();
        let obs = Observation {
            objects: Vec::new(),
            gripper: GripperPose::default(),
            desk_bounds: bounds,
        };
        assert_eq!(flatten(&obs).len(), TAIL_FEATURES);
    }
}
