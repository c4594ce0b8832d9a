//! Bevy resource wrapping all Rapier3D physics pipeline state.

use bevy::prelude::{Resource, Vec3};
use nalgebra::{point, vector};
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Ray,
    Real, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, RigidBodyType, Vector,
};

use deskbot_core::types::Shape;

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn to_na(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_glam(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Tuning for dynamic body creation.
#[derive(Debug, Clone, Copy)]
pub struct DynamicOptions {
    /// Keep the body upright; scene objects are carried, not rolled.
    pub lock_rotations: bool,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub density: f32,
}

impl Default for DynamicOptions {
    fn default() -> Self {
        Self {
            lock_rotations: false,
            linear_damping: 0.2,
            angular_damping: 0.8,
            density: 1.0,
        }
    }
}

/// Result of a downward ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

// ---------------------------------------------------------------------------
// PhysicsContext
// ---------------------------------------------------------------------------

/// All rapier state in a single Bevy resource.
///
/// `PhysicsPipeline::step()` requires mutable access to every set
/// simultaneously, so they must all live together.
#[derive(Resource)]
pub struct PhysicsContext {
    // -- Rapier sets --
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,

    // -- Pipeline objects --
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,

    // -- Parameters --
    integration_parameters: IntegrationParameters,
    gravity: Vector<Real>,
}

impl PhysicsContext {
    /// Create a new context with the given gravity vector and timestep.
    #[must_use]
    pub fn new(gravity: Vec3, dt: f32) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            integration_parameters,
            gravity: to_na(gravity),
        }
    }

    /// The fixed timestep in seconds.
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    // -- Body creation --

    fn collider_for(shape: &Shape) -> ColliderBuilder {
        match *shape {
            Shape::Cylinder {
                radius,
                half_height,
            } => ColliderBuilder::cylinder(half_height, radius),
            Shape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents[0], half_extents[1], half_extents[2])
            }
            Shape::Sphere { radius } => ColliderBuilder::ball(radius),
        }
    }

    /// Insert a dynamic body with one primitive collider.
    pub fn add_dynamic(
        &mut self,
        position: Vec3,
        shape: &Shape,
        options: DynamicOptions,
    ) -> RigidBodyHandle {
        let mut builder = RigidBodyBuilder::dynamic()
            .translation(to_na(position))
            .linear_damping(options.linear_damping)
            .angular_damping(options.angular_damping)
            .can_sleep(false);
        if options.lock_rotations {
            builder = builder.lock_rotations();
        }
        let handle = self.rigid_body_set.insert(builder.build());
        let collider = Self::collider_for(shape)
            .density(options.density)
            .friction(0.8)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Insert a fixed (static) body with one primitive collider.
    pub fn add_fixed(&mut self, position: Vec3, shape: &Shape) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed().translation(to_na(position)).build();
        let handle = self.rigid_body_set.insert(body);
        let collider = Self::collider_for(shape).friction(0.8).build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Remove a body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    #[must_use]
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    // -- Pose and velocity access --

    #[must_use]
    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|b| to_glam(b.translation()))
    }

    pub fn set_translation(&mut self, handle: RigidBodyHandle, position: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_translation(to_na(position), true);
        }
    }

    #[must_use]
    pub fn linvel(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|b| to_glam(b.linvel()))
    }

    pub fn set_linvel(&mut self, handle: RigidBodyHandle, velocity: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linvel(to_na(velocity), true);
        }
    }

    pub fn zero_velocity(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linvel(vector![0.0, 0.0, 0.0], true);
            body.set_angvel(vector![0.0, 0.0, 0.0], true);
        }
    }

    // -- Body type switching (grasp/release) --

    /// Switch a body to position-based kinematic control.
    pub fn set_kinematic(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_body_type(RigidBodyType::KinematicPositionBased, true);
        }
    }

    /// Return a body to dynamic simulation.
    pub fn set_dynamic(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_body_type(RigidBodyType::Dynamic, true);
        }
    }

    #[must_use]
    pub fn is_kinematic(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .get(handle)
            .is_some_and(|b| b.is_kinematic())
    }

    /// Set the kinematic target for the next step.
    pub fn move_kinematic(&mut self, handle: RigidBodyHandle, target: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_next_kinematic_translation(to_na(target));
        }
    }

    // -- Stepping --

    /// Run one fixed physics step.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    // -- Ray casting --

    /// Cast a ray and return the nearest hit.
    ///
    /// Iterates colliders directly rather than maintaining a query pipeline;
    /// calibration scans run once per reset over a handful of colliders, so
    /// there is nothing to amortize.
    #[must_use]
    pub fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let ray = Ray::new(point![origin.x, origin.y, origin.z], to_na(direction));
        let mut best: Option<RayHit> = None;
        for (_, collider) in self.collider_set.iter() {
            let Some(hit) =
                collider
                    .shape()
                    .cast_ray_and_get_normal(collider.position(), &ray, max_distance, true)
            else {
                continue;
            };
            if best.is_none_or(|b| hit.time_of_impact < b.distance) {
                let p = ray.point_at(hit.time_of_impact);
                best = Some(RayHit {
                    point: Vec3::new(p.x, p.y, p.z),
                    normal: Vec3::new(hit.normal.x, hit.normal.y, hit.normal.z),
                    distance: hit.time_of_impact,
                });
            }
        }
        best
    }

    /// Cast straight down from `(x, origin_height, z)`.
    #[must_use]
    pub fn cast_ray_down(&self, x: f32, z: f32, origin_height: f32) -> Option<RayHit> {
        self.cast_ray(
            Vec3::new(x, origin_height, z),
            Vec3::new(0.0, -1.0, 0.0),
            2.0 * origin_height.abs().max(1.0),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
