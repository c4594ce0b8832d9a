//! Spawning scene objects.
//!
//! A [`SpawnRequest`] pairs a collider shape with an optional visual model.
//! If the model fails to resolve the object still spawns with a primitive
//! visual matching the collider footprint; physics is never blocked on
//! rendering assets.

use bevy::prelude::Vec3;
use rand::Rng;
use tracing::{debug, warn};

use deskbot_core::bounds::DeskBounds;
use deskbot_core::types::{ColorTag, ObjectId, ObjectKind, Shape};
use deskbot_physics::{DynamicOptions, PhysicsContext};

use crate::assets::VisualBackend;
use crate::registry::ObjectRegistry;

/// Everything needed to spawn one object.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub kind: ObjectKind,
    pub color: ColorTag,
    pub shape: Shape,
    pub position: Vec3,
    /// Visual model path; `None` goes straight to the primitive visual.
    pub model: Option<String>,
}

impl SpawnRequest {
    #[must_use]
    pub fn pen(position: Vec3, color: ColorTag) -> Self {
        Self {
            kind: ObjectKind::Utensil,
            color,
            shape: Shape::Cylinder {
                radius: 0.01,
                half_height: 0.07,
            },
            position,
            model: Some("models/pen.glb".into()),
        }
    }

    #[must_use]
    pub fn marker(position: Vec3, color: ColorTag) -> Self {
        Self {
            kind: ObjectKind::Utensil,
            color,
            shape: Shape::Cylinder {
                radius: 0.015,
                half_height: 0.06,
            },
            position,
            model: Some("models/marker.glb".into()),
        }
    }

    #[must_use]
    pub fn book(position: Vec3, color: ColorTag) -> Self {
        Self {
            kind: ObjectKind::Book,
            color,
            shape: Shape::Cuboid {
                half_extents: [0.09, 0.02, 0.065],
            },
            position,
            model: Some("models/book.glb".into()),
        }
    }

    #[must_use]
    pub fn crumpled_paper(position: Vec3) -> Self {
        Self {
            kind: ObjectKind::Trash,
            color: ColorTag::Neutral,
            shape: Shape::Sphere { radius: 0.03 },
            position,
            model: Some("models/crumpled_paper.glb".into()),
        }
    }

    #[must_use]
    pub fn soda_can(position: Vec3) -> Self {
        Self {
            kind: ObjectKind::Trash,
            color: ColorTag::Neutral,
            shape: Shape::Cylinder {
                radius: 0.033,
                half_height: 0.06,
            },
            position,
            model: Some("models/soda_can.glb".into()),
        }
    }
}

/// Spawn one object: dynamic body, visual (with fallback), registry entry.
pub fn spawn_object(
    registry: &mut ObjectRegistry,
    physics: &mut PhysicsContext,
    visuals: &mut dyn VisualBackend,
    request: &SpawnRequest,
) -> ObjectId {
    let body = physics.add_dynamic(
        request.position,
        &request.shape,
        DynamicOptions {
            lock_rotations: true,
            ..DynamicOptions::default()
        },
    );

    let visual = match &request.model {
        Some(model) => visuals.instantiate_model(model).unwrap_or_else(|err| {
            warn!(%err, "falling back to primitive visual");
            visuals.instantiate_primitive(&request.shape, request.color)
        }),
        None => visuals.instantiate_primitive(&request.shape, request.color),
    };

    let id = registry.register(request.kind, request.color, request.shape, body, visual);
    debug!(%id, kind = ?request.kind, "spawned object");
    id
}

/// Spawn the standard desk layout with jittered placements drawn from the
/// caller's RNG: three utensils, two books, three pieces of trash, scattered
/// over the middle of the surface.
pub fn populate_desk(
    registry: &mut ObjectRegistry,
    physics: &mut PhysicsContext,
    visuals: &mut dyn VisualBackend,
    bounds: &DeskBounds,
    rng: &mut impl Rng,
) -> Vec<ObjectId> {
    let center = bounds.center();
    let half = bounds.half_extents();

    // Nominal placements as fractions of the desk half-extents, so the same
    // layout fits every calibrated world.
    let at = |fx: f32, fz: f32| Vec3::new(center.x + fx * half.x, 0.0, center.z + fz * half.z);
    let requests = [
        SpawnRequest::pen(at(-0.3, -0.4), ColorTag::Blue),
        SpawnRequest::pen(at(0.1, 0.5), ColorTag::Red),
        SpawnRequest::marker(at(-0.6, 0.3), ColorTag::Green),
        SpawnRequest::book(at(0.45, -0.3), ColorTag::Yellow),
        SpawnRequest::book(at(-0.15, 0.1), ColorTag::Blue),
        SpawnRequest::crumpled_paper(at(0.55, 0.45)),
        SpawnRequest::crumpled_paper(at(-0.45, -0.15)),
        SpawnRequest::soda_can(at(0.25, 0.0)),
    ];

    let surface = bounds.surface_y();
    let mut ids = Vec::with_capacity(requests.len());
    for mut request in requests {
        let jitter_x: f32 = rng.gen_range(-0.03..0.03);
        let jitter_z: f32 = rng.gen_range(-0.03..0.03);
        request.position.x += jitter_x;
        request.position.z += jitter_z;
        // Drop in from just above the surface so nothing spawns intersecting.
        request.position.y = surface + request.shape.vertical_half_extent() + 0.02;
        ids.push(spawn_object(registry, physics, visuals, &request));
    }
    ids
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
