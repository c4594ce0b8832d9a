//! Raycast surface detection.
//!
//! Fires a downward ray grid over a search rectangle, keeps hits on
//! near-horizontal faces, clusters the hit points into height bands, and
//! takes the most-populated band as the work surface. If a larger horizontal
//! surface (such as an uncovered floor) dominates the search rectangle it
//! will win the vote; confine the rectangle or use the static table when
//! that is not what you want.

use std::collections::BTreeMap;

use bevy::prelude::Vec3;
use tracing::{debug, info};

use deskbot_core::bounds::DeskBounds;
use deskbot_core::config::ScanConfig;
use deskbot_core::error::CalibrationError;
use deskbot_physics::PhysicsContext;

use crate::Calibrator;

/// Calibrator that detects the surface by scanning the scene with rays.
#[derive(Debug, Clone, Copy, Default)]
pub struct RaycastCalibrator {
    scan: ScanConfig,
}

impl RaycastCalibrator {
    #[must_use]
    pub const fn new(scan: ScanConfig) -> Self {
        Self { scan }
    }
}

impl Calibrator for RaycastCalibrator {
    fn calibrate(&self, physics: &PhysicsContext) -> Result<DeskBounds, CalibrationError> {
        let scan = &self.scan;
        if scan.rect_min[0] >= scan.rect_max[0] || scan.rect_min[1] >= scan.rect_max[1] {
            return Err(CalibrationError::EmptyScanRect);
        }

        let mut rays_cast = 0usize;
        let mut bands: BTreeMap<i64, Vec<Vec3>> = BTreeMap::new();

        let mut x = scan.rect_min[0];
        while x <= scan.rect_max[0] {
            let mut z = scan.rect_min[1];
            while z <= scan.rect_max[1] {
                rays_cast += 1;
                if let Some(hit) = physics.cast_ray_down(x, z, scan.origin_height) {
                    if hit.normal.y >= scan.min_up_dot {
                        #[allow(clippy::cast_possible_truncation)]
                        let band = (hit.point.y / scan.band_height).floor() as i64;
                        bands.entry(band).or_default().push(hit.point);
                    }
                }
                z += scan.grid_spacing;
            }
            x += scan.grid_spacing;
        }

        // Most-populated band wins; BTreeMap iteration keeps ties
        // deterministic (lowest band).
        let Some((band, points)) = bands.iter().max_by_key(|(_, points)| points.len()) else {
            return Err(CalibrationError::NoSurfaceFound { rays_cast });
        };
        debug!(
            band,
            hits = points.len(),
            bands = bands.len(),
            rays_cast,
            "surface vote"
        );

        let mut min = points[0];
        let mut max = points[0];
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        min.y -= scan.vertical_pad;
        max.y += scan.vertical_pad;

        let bounds = DeskBounds::from_corners(min, max);
        info!(?bounds, rays_cast, "raycast calibration");
        Ok(bounds)
    }

    fn name(&self) -> &str {
        "raycast"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use deskbot_core::types::Shape;

    const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

    fn empty_physics() -> PhysicsContext {
        PhysicsContext::new(GRAVITY, 1.0 / 60.0)
    }

    fn physics_with_desk() -> PhysicsContext {
        let mut physics = empty_physics();
        // 1.2 x 0.8 desk, top at y = 0.775.
        physics.add_fixed(
            Vec3::new(0.0, 0.75, 0.0),
            &Shape::Cuboid {
                half_extents: [0.6, 0.025, 0.4],
            },
        );
        physics
    }

    #[test]
    fn detects_desk_extents_within_grid_spacing() {
        let physics = physics_with_desk();
        let scan = ScanConfig::default();
        let bounds = RaycastCalibrator::new(scan).calibrate(&physics).unwrap();

        let tol = scan.grid_spacing + 1e-3;
        assert!((bounds.min_x + 0.6).abs() <= tol, "min_x = {}", bounds.min_x);
        assert!((bounds.max_x - 0.6).abs() <= tol, "max_x = {}", bounds.max_x);
        assert!((bounds.min_z + 0.4).abs() <= tol, "min_z = {}", bounds.min_z);
        assert!((bounds.max_z - 0.4).abs() <= tol, "max_z = {}", bounds.max_z);
        // Surface height recovered from the padded band.
        assert!((bounds.surface_y() - 0.775).abs() < 1e-3);
        assert!((bounds.max_y - bounds.min_y - 2.0 * scan.vertical_pad).abs() < 1e-3);
    }

    #[test]
    fn empty_scene_reports_rays_cast() {
        let physics = empty_physics();
        let result = RaycastCalibrator::new(ScanConfig::default()).calibrate(&physics);
        match result {
            Err(CalibrationError::NoSurfaceFound { rays_cast }) => {
                assert!(rays_cast > 1000, "expected a dense scan, got {rays_cast}");
            }
            other => panic!("expected NoSurfaceFound, got {other:?}"),
        }
    }

    #[test]
    fn degenerate_rect_is_rejected() {
        let physics = physics_with_desk();
        let scan = ScanConfig {
            rect_min: [1.0, -3.0],
            rect_max: [-1.0, 3.0],
            ..ScanConfig::default()
        };
        assert_eq!(
            RaycastCalibrator::new(scan).calibrate(&physics),
            Err(CalibrationError::EmptyScanRect)
        );
    }

    #[test]
    fn steep_faces_do_not_count_as_surface() {
        let mut physics = empty_physics();
        // A large ball: only the cap near the top has a near-vertical normal,
        // so qualifying hits cluster tightly around its apex.
        physics.add_fixed(Vec3::new(0.0, 1.0, 0.0), &Shape::Sphere { radius: 1.0 });
        let bounds = RaycastCalibrator::new(ScanConfig::default())
            .calibrate(&physics)
            .unwrap();
        // Hits on the steep flanks (y well below the apex) were rejected.
        assert!(bounds.min_y + ScanConfig::default().vertical_pad > 1.7);
    }

    #[test]
    fn largest_band_wins_when_floor_is_exposed() {
        let mut physics = physics_with_desk();
        physics.add_fixed(
            Vec3::new(0.0, -0.01, 0.0),
            &Shape::Cuboid {
                half_extents: [5.0, 0.01, 5.0],
            },
        );
        let bounds = RaycastCalibrator::new(ScanConfig::default())
            .calibrate(&physics)
            .unwrap();
        // The exposed floor gathers far more hits than the desk top.
        assert!(bounds.surface_y() < 0.3, "floor should out-vote the desk");
    }

    #[test]
    fn confined_rect_finds_the_desk_over_a_floor() {
        let mut physics = physics_with_desk();
        physics.add_fixed(
            Vec3::new(0.0, -0.01, 0.0),
            &Shape::Cuboid {
                half_extents: [5.0, 0.01, 5.0],
            },
        );
        let scan = ScanConfig {
            rect_min: [-0.5, -0.3],
            rect_max: [0.5, 0.3],
            ..ScanConfig::default()
        };
        let bounds = RaycastCalibrator::new(scan).calibrate(&physics).unwrap();
        assert!((bounds.surface_y() - 0.775).abs() < 1e-3);
    }
}
