//! Compiled-in per-world bounds.
//!
//! Each supported world was measured once with the raycast scanner and the
//! result frozen here, so resets skip the scan entirely.

use bevy::prelude::Vec3;
use tracing::{info, warn};

use deskbot_core::bounds::DeskBounds;
use deskbot_core::error::CalibrationError;
use deskbot_physics::PhysicsContext;

use crate::Calibrator;

/// World id whose bounds serve as the fallback for unknown ids.
pub const BASELINE_WORLD: u32 = 2;

/// Calibrator backed by a compiled-in measurement table.
#[derive(Debug, Clone, Copy)]
pub struct StaticCalibrator {
    world: u32,
}

impl StaticCalibrator {
    #[must_use]
    pub const fn new(world: u32) -> Self {
        Self { world }
    }

    /// Measured bounds for a known world id.
    #[must_use]
    pub fn lookup(world: u32) -> Option<DeskBounds> {
        // Vertical band: surface height padded +/- 0.5.
        match world {
            1 => Some(DeskBounds::from_corners(
                Vec3::new(-0.55, 0.275, -0.35),
                Vec3::new(0.55, 1.275, 0.35),
            )),
            2 => Some(DeskBounds::from_corners(
                Vec3::new(-0.6, 0.275, -0.4),
                Vec3::new(0.6, 1.275, 0.4),
            )),
            3 => Some(DeskBounds::from_corners(
                Vec3::new(-0.5, 0.24, -0.38),
                Vec3::new(0.5, 1.24, 0.38),
            )),
            _ => None,
        }
    }
}

impl Calibrator for StaticCalibrator {
    fn calibrate(&self, _physics: &PhysicsContext) -> Result<DeskBounds, CalibrationError> {
        match Self::lookup(self.world) {
            Some(bounds) => {
                info!(world = self.world, ?bounds, "static calibration");
                Ok(bounds)
            }
            None => {
                // Unknown ids get the baseline measurement rather than an
                // error; a wrong-but-sane desk beats no desk.
                warn!(
                    world = self.world,
                    baseline = BASELINE_WORLD,
                    "unknown world id, using baseline bounds"
                );
                Ok(Self::lookup(BASELINE_WORLD).unwrap_or_default())
            }
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
