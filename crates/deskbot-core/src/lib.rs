//! Core types for the deskbot manipulation engine.
//!
//! This crate holds everything the other workspace crates share: the object
//! data model, desk bounds and derived zones, the error taxonomy, TOML-backed
//! configuration, the fixed-timestep clock, and deterministic seed derivation.
//! It contains no physics or control logic.

pub mod bounds;
pub mod config;
pub mod error;
pub mod seed;
pub mod time;
pub mod traits;
pub mod types;

/// Commonly used re-exports.
pub mod prelude {
    pub use crate::bounds::{DeskBounds, Zone};
    pub use crate::config::{
        EngineConfig, ExecutorConfig, GripperConfig, RewardConfig, ScanConfig,
    };
    pub use crate::error::{CalibrationError, ConfigError, DeskbotError, ValidationError};
    pub use crate::seed::{derive_seed, derive_seed_indexed, episode_rng};
    pub use crate::time::TickClock;
    pub use crate::traits::Policy;
    pub use crate::types::{
        Action, ColorTag, GraspCommand, GripperPose, Observation, ObjectGroup, ObjectId,
        ObjectKind, ObjectState, Shape, StepInfo, StepResult,
    };
}
