//! Visual backend seam.
//!
//! The engine never talks to a renderer directly; it holds opaque
//! [`VisualHandle`]s and pushes transforms through the [`VisualBackend`]
//! trait. The headless implementation records transforms and nothing else,
//! which is all tests and training runs need.

use std::collections::{HashMap, HashSet};

use bevy::prelude::{Resource, Vec3};

use deskbot_core::error::AssetError;
use deskbot_core::types::{ColorTag, Shape};

/// Opaque handle to one visual instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u64);

/// Rendering seam. Implementations must tolerate handles they have already
/// released.
pub trait VisualBackend: Send + Sync {
    /// Instantiate a model asset by path.
    fn instantiate_model(&mut self, model: &str) -> Result<VisualHandle, AssetError>;

    /// Instantiate a plain primitive matching a collider footprint. This is
    /// the fallback when a model fails to resolve and cannot itself fail.
    fn instantiate_primitive(&mut self, shape: &Shape, color: ColorTag) -> VisualHandle;

    /// Move a visual instance.
    fn set_transform(&mut self, handle: VisualHandle, position: Vec3);

    /// Drop a visual instance.
    fn release(&mut self, handle: VisualHandle);
}

/// Boxed backend as a Bevy resource.
#[derive(Resource)]
pub struct Visuals(pub Box<dyn VisualBackend>);

// ---------------------------------------------------------------------------
// HeadlessVisuals
// ---------------------------------------------------------------------------

/// Backend with no renderer behind it.
///
/// Models resolve only if registered via [`insert_model`](Self::insert_model),
/// so the spawn fallback path is exercised under test exactly as it would be
/// against a real asset server with a missing file.
#[derive(Debug, Default)]
pub struct HeadlessVisuals {
    next: u64,
    known_models: HashSet<String>,
    transforms: HashMap<VisualHandle, Vec3>,
}

impl HeadlessVisuals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model path as loadable.
    pub fn insert_model(&mut self, model: impl Into<String>) {
        self.known_models.insert(model.into());
    }

    /// Last transform pushed for a handle, if it is still live.
    #[must_use]
    pub fn transform(&self, handle: VisualHandle) -> Option<Vec3> {
        self.transforms.get(&handle).copied()
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.transforms.len()
    }

    fn alloc(&mut self) -> VisualHandle {
        let handle = VisualHandle(self.next);
        self.next += 1;
        self.transforms.insert(handle, Vec3::ZERO);
        handle
    }
}

impl VisualBackend for HeadlessVisuals {
    fn instantiate_model(&mut self, model: &str) -> Result<VisualHandle, AssetError> {
        if self.known_models.contains(model) {
            Ok(self.alloc())
        } else {
            Err(AssetError::LoadFailed(model.to_owned()))
        }
    }

    fn instantiate_primitive(&mut self, _shape: &Shape, _color: ColorTag) -> VisualHandle {
        self.alloc()
    }

    fn set_transform(&mut self, handle: VisualHandle, position: Vec3) {
        if let Some(t) = self.transforms.get_mut(&handle) {
            *t = position;
        }
    }

    fn release(&mut self, handle: VisualHandle) {
        self.transforms.remove(&handle);
    }
}

// ---------------------------------------------------------------------------
// Transform sync
// ---------------------------------------------------------------------------

/// Push every registered object's body translation to its visual.
pub fn sync_visuals(
    registry: &crate::registry::ObjectRegistry,
    physics: &deskbot_physics::PhysicsContext,
    visuals: &mut dyn VisualBackend,
) {
    for object in registry.iter() {
        if let Some(position) = physics.translation(object.body) {
            visuals.set_transform(object.visual, position);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_fails_to_load() {
        let mut visuals = HeadlessVisuals::new();
        let result = visuals.instantiate_model("models/soda_can.glb");
        assert_eq!(
            result,
            Err(AssetError::LoadFailed("models/soda_can.glb".into()))
        );
    }

    #[test]
    fn registered_model_loads() {
        let mut visuals = HeadlessVisuals::new();
        visuals.insert_model("models/soda_can.glb");
        assert!(visuals.instantiate_model("models/soda_can.glb").is_ok());
    }

    #[test]
    fn primitive_always_succeeds() {
        let mut visuals = HeadlessVisuals::new();
        let handle =
            visuals.instantiate_primitive(&Shape::Sphere { radius: 0.03 }, ColorTag::Neutral);
        assert_eq!(visuals.live_count(), 1);
        assert_eq!(visuals.transform(handle), Some(Vec3::ZERO));
    }

    #[test]
    fn transforms_stick_and_release_drops() {
        let mut visuals = HeadlessVisuals::new();
        let handle =
            visuals.instantiate_primitive(&Shape::Sphere { radius: 0.03 }, ColorTag::Red);
        visuals.set_transform(handle, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(visuals.transform(handle), Some(Vec3::new(1.0, 2.0, 3.0)));
        visuals.release(handle);
        assert_eq!(visuals.transform(handle), None);
        // Releasing again is a no-op.
        visuals.release(handle);
    }
}
