//! Desk surface calibration.
//!
//! A calibrator turns the current physics scene (or a compiled-in table)
//! into the [`DeskBounds`] every other component keys off. Calibration runs
//! exactly once per environment reset.

pub mod raycast;
pub mod static_table;

use deskbot_core::bounds::DeskBounds;
use deskbot_core::error::CalibrationError;
use deskbot_physics::PhysicsContext;

pub use raycast::RaycastCalibrator;
pub use static_table::StaticCalibrator;

/// Capability seam for surface detection strategies.
pub trait Calibrator {
    /// Produce the desk bounds for the current scene.
    fn calibrate(&self, physics: &PhysicsContext) -> Result<DeskBounds, CalibrationError>;

    /// Strategy name for logs.
    fn name(&self) -> &str;
}
