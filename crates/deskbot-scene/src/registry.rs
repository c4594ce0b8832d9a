//! The object registry: stable ids mapped to physics bodies and visuals.

use bevy::prelude::Resource;
use rapier3d::prelude::RigidBodyHandle;

use deskbot_core::types::{ColorTag, ObjectGroup, ObjectId, ObjectKind, ObjectState, Shape};
use deskbot_physics::PhysicsContext;

use crate::assets::{VisualBackend, VisualHandle};

/// Summed absolute velocity components above this mark an object as moving.
pub const MOVING_SPEED_SUM: f32 = 0.01;

/// One registered scene object. Holds exactly one body and one visual for
/// its whole lifetime.
#[derive(Debug, Clone, Copy)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub group: ObjectGroup,
    pub color: ColorTag,
    pub shape: Shape,
    pub body: RigidBodyHandle,
    pub visual: VisualHandle,
}

/// Registry of live scene objects.
///
/// Ids are assigned monotonically and never reused, so stale references can
/// be detected instead of silently aliasing newer objects.
#[derive(Resource, Default)]
pub struct ObjectRegistry {
    objects: Vec<SceneObject>,
    next_id: u64,
}

impl ObjectRegistry {
    /// Register an already-created body/visual pair under a fresh id.
    pub fn register(
        &mut self,
        kind: ObjectKind,
        color: ColorTag,
        shape: Shape,
        body: RigidBodyHandle,
        visual: VisualHandle,
    ) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(SceneObject {
            id,
            kind,
            group: kind.default_group(),
            color,
            shape,
            body,
            visual,
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    /// All objects in a task group. An empty registry yields an empty list.
    #[must_use]
    pub fn find_by_group(&self, group: ObjectGroup) -> Vec<&SceneObject> {
        self.objects.iter().filter(|o| o.group == group).collect()
    }

    /// Explicitly remove one object, destroying its body and visual.
    ///
    /// Not part of normal task flow; tasks referencing the id afterwards are
    /// discarded by the executor.
    pub fn remove(
        &mut self,
        id: ObjectId,
        physics: &mut PhysicsContext,
        visuals: &mut dyn VisualBackend,
    ) -> bool {
        let Some(index) = self.objects.iter().position(|o| o.id == id) else {
            return false;
        };
        let object = self.objects.swap_remove(index);
        physics.remove_body(object.body);
        visuals.release(object.visual);
        true
    }

    /// Remove every object. Ids keep counting up across the clear.
    pub fn clear(&mut self, physics: &mut PhysicsContext, visuals: &mut dyn VisualBackend) {
        for object in self.objects.drain(..) {
            physics.remove_body(object.body);
            visuals.release(object.visual);
        }
    }

    /// Point-in-time state of every object, read fresh from the physics
    /// state on every call.
    #[must_use]
    pub fn snapshot(&self, physics: &PhysicsContext) -> Vec<ObjectState> {
        let mut states = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            let Some(position) = physics.translation(object.body) else {
                continue;
            };
            let velocity = physics.linvel(object.body).unwrap_or_default();
            let speed_sum = velocity.x.abs() + velocity.y.abs() + velocity.z.abs();
            states.push(ObjectState {
                id: object.id,
                kind: object.kind,
                group: object.group,
                color: object.color,
                position: position.to_array(),
                velocity: velocity.to_array(),
                is_moving: speed_sum > MOVING_SPEED_SUM,
            });
        }
        states
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
