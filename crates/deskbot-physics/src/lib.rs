//! Physics backend for the deskbot engine.
//!
//! Wraps the whole Rapier3D pipeline in one resource, [`PhysicsContext`],
//! exposing exactly the operations the rest of the workspace needs: body
//! creation with primitive colliders, pose and velocity access, kinematic
//! re-parenting for carried objects, fixed stepping, and downward ray casts
//! for surface calibration.

pub mod context;

pub use context::{DynamicOptions, PhysicsContext, RayHit};
pub use rapier3d::prelude::RigidBodyHandle;
