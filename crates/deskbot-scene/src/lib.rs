//! Scene management: the object registry, the spawn path with its visual
//! asset fallback, and the physics-to-visual transform sync.

pub mod assets;
pub mod registry;
pub mod spawn;

pub use assets::{HeadlessVisuals, VisualBackend, VisualHandle, Visuals, sync_visuals};
pub use registry::{ObjectRegistry, SceneObject};
pub use spawn::{SpawnRequest, populate_desk, spawn_object};
