//! Kinematic end-effector.
//!
//! The gripper is a commanded position, not a simulated body: it moves at a
//! fixed speed toward targets and carries objects by re-parenting them to a
//! kinematic offset below itself. Grasping is distance-based with a radius
//! deliberately generous relative to object size; there are no contact
//! forces involved.

use bevy::prelude::{Resource, Vec3};
use rapier3d::prelude::RigidBodyHandle;
use tracing::debug;

use deskbot_core::config::GripperConfig;
use deskbot_core::types::{GripperPose, ObjectId};
use deskbot_physics::PhysicsContext;
use deskbot_scene::ObjectRegistry;

#[derive(Debug, Clone, Copy)]
struct Held {
    id: ObjectId,
    body: RigidBodyHandle,
}

/// The kinematic gripper actuator.
#[derive(Resource)]
pub struct Gripper {
    position: Vec3,
    held: Option<Held>,
    config: GripperConfig,
}

impl Gripper {
    #[must_use]
    pub fn new(position: Vec3, config: GripperConfig) -> Self {
        Self {
            position,
            held: None,
            config,
        }
    }

    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Teleport, used only by environment reset.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    #[must_use]
    pub const fn is_grasping(&self) -> bool {
        self.held.is_some()
    }

    #[must_use]
    pub fn held_object(&self) -> Option<ObjectId> {
        self.held.map(|h| h.id)
    }

    #[must_use]
    pub fn pose(&self) -> GripperPose {
        GripperPose {
            position: self.position.to_array(),
            grasping: self.held.is_some(),
        }
    }

    /// Displace the gripper directly (policy-driven control). The floor
    /// clamp still applies.
    pub fn apply_delta(&mut self, delta: Vec3) {
        self.position += delta;
        self.position.y = self.position.y.max(self.config.floor_y);
    }

    /// Advance toward `target` for one tick. Returns `true` on arrival.
    ///
    /// Travel speed drops while holding an object. The Y floor clamp means a
    /// target below the floor is never reachable; callers detect that via
    /// stuck recovery rather than here.
    pub fn move_toward(&mut self, target: Vec3, dt: f32) -> bool {
        let speed = if self.held.is_some() {
            self.config.loaded_speed
        } else {
            self.config.speed
        };
        let to_target = target - self.position;
        let distance = to_target.length();
        let step = speed * dt;
        if distance <= step {
            self.position = target;
        } else {
            self.position += to_target / distance * step;
        }
        self.position.y = self.position.y.max(self.config.floor_y);
        (self.position - target).length() < self.config.arrive_eps
    }

    /// Attempt a grasp. Refused while already holding. With a specific
    /// target the object must be within the grasp radius; with `None` the
    /// nearest in-range object is taken.
    ///
    /// Success re-parents the body to kinematic control so it tracks the
    /// gripper exactly; an intended approximation of a real grasp, not a
    /// force simulation.
    pub fn grasp(
        &mut self,
        registry: &ObjectRegistry,
        physics: &mut PhysicsContext,
        target: Option<ObjectId>,
    ) -> bool {
        if self.held.is_some() {
            return false;
        }

        let in_range = |body: RigidBodyHandle| -> Option<f32> {
            let pos = physics.translation(body)?;
            let distance = (pos - self.position).length();
            (distance <= self.config.grasp_radius).then_some(distance)
        };

        let candidate = match target {
            Some(id) => registry
                .get(id)
                .and_then(|o| in_range(o.body).map(|d| (o, d))),
            None => registry
                .iter()
                .filter_map(|o| in_range(o.body).map(|d| (o, d)))
                .min_by(|a, b| a.1.total_cmp(&b.1)),
        };

        let Some((object, distance)) = candidate else {
            return false;
        };
        physics.set_kinematic(object.body);
        self.held = Some(Held {
            id: object.id,
            body: object.body,
        });
        debug!(id = %object.id, distance, "grasped");
        true
    }

    /// Release the held object. Refused when empty-handed. The body returns
    /// to dynamic simulation with all velocity zeroed so it drops straight
    /// down.
    pub fn release(&mut self, physics: &mut PhysicsContext) -> bool {
        let Some(held) = self.held.take() else {
            return false;
        };
        physics.set_dynamic(held.body);
        physics.zero_velocity(held.body);
        debug!(id = %held.id, "released");
        true
    }

    /// Pin the held body to the carry offset below the gripper. Call every
    /// tick before the physics step.
    pub fn carry_sync(&self, physics: &mut PhysicsContext) {
        if let Some(held) = self.held {
            let target = self.position - Vec3::Y * self.config.carry_offset;
            physics.move_kinematic(held.body, target);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
