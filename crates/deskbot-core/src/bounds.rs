//! Desk bounds and the zones derived from them.
//!
//! A [`DeskBounds`] is produced once per reset by a calibrator and treated as
//! immutable for the episode. Zones are pure functions of the bounds plus an
//! inset margin; they are never stored.

use bevy::math::Vec3;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How far beyond the desk edge the off-table drop point sits, in meters.
pub const OFF_TABLE_CLEARANCE: f32 = 0.4;

// ---------------------------------------------------------------------------
// DeskBounds
// ---------------------------------------------------------------------------

/// Axis-aligned extent of the usable desk surface. Y is up.
///
/// The vertical range brackets the detected surface with symmetric padding,
/// so [`surface_y`](Self::surface_y) recovers the surface height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
pub struct DeskBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl DeskBounds {
    /// Build bounds from two opposite corners, normalizing each axis so that
    /// min <= max always holds.
    #[must_use]
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min_x: a.x.min(b.x),
            max_x: a.x.max(b.x),
            min_y: a.y.min(b.y),
            max_y: a.y.max(b.y),
            min_z: a.z.min(b.z),
            max_z: a.z.max(b.z),
        }
    }

    /// Check the per-axis ordering invariant on externally supplied values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let axes = [
            ("x", self.min_x, self.max_x),
            ("y", self.min_y, self.max_y),
            ("z", self.min_z, self.max_z),
        ];
        for (name, min, max) in axes {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(ConfigError::InvalidValue {
                    field: format!("bounds.{name}"),
                    message: format!("min ({min}) must be finite and <= max ({max})"),
                });
            }
        }
        Ok(())
    }

    /// Arithmetic midpoint of the bounds.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
            (self.min_z + self.max_z) * 0.5,
        )
    }

    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(
            (self.max_x - self.min_x) * 0.5,
            (self.max_y - self.min_y) * 0.5,
            (self.max_z - self.min_z) * 0.5,
        )
    }

    /// Height of the calibrated surface (vertical midpoint of the band).
    #[must_use]
    pub fn surface_y(&self) -> f32 {
        (self.min_y + self.max_y) * 0.5
    }

    /// Is the point horizontally over the desk?
    #[must_use]
    pub fn contains_xz(&self, p: Vec3) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }

    /// On-desk predicate used by rewards: horizontally inside and within the
    /// calibrated vertical band.
    #[must_use]
    pub fn is_on_desk(&self, p: Vec3) -> bool {
        self.contains_xz(p) && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Off-desk predicate: horizontally outside and fallen below the band.
    ///
    /// A point hovering beside the desk at surface height is neither on nor
    /// off; it scores nothing until it lands somewhere.
    #[must_use]
    pub fn is_off_desk(&self, p: Vec3) -> bool {
        !self.contains_xz(p) && p.y < self.min_y
    }

    // ---- Zones ----

    /// Horizontal rectangle of an on-desk zone, inset from the desk edge.
    /// Returns `((min_x, min_z), (max_x, max_z))`.
    fn zone_rect(&self, zone: Zone, inset: f32) -> Option<([f32; 2], [f32; 2])> {
        let x0 = self.min_x + inset;
        let x1 = self.max_x - inset;
        let z0 = self.min_z + inset;
        let z1 = self.max_z - inset;
        let w = x1 - x0;
        let d = z1 - z0;
        match zone {
            Zone::Left => Some(([x0, z0], [x0 + w / 3.0, z1])),
            Zone::Right => Some(([x1 - w / 3.0, z0], [x1, z1])),
            Zone::Corner => Some(([x0, z0], [x0 + w / 4.0, z0 + d / 4.0])),
            Zone::Center => Some((
                [x0 + w / 3.0, z0 + d / 3.0],
                [x1 - w / 3.0, z1 - d / 3.0],
            )),
            Zone::OffTable => None,
        }
    }

    /// Representative placement point for a zone, at surface height.
    ///
    /// For [`Zone::OffTable`] this is a drop point beyond the +X edge.
    #[must_use]
    pub fn zone_anchor(&self, zone: Zone, inset: f32) -> Vec3 {
        match self.zone_rect(zone, inset) {
            Some((min, max)) => Vec3::new(
                (min[0] + max[0]) * 0.5,
                self.surface_y(),
                (min[1] + max[1]) * 0.5,
            ),
            None => Vec3::new(
                self.max_x + OFF_TABLE_CLEARANCE,
                self.surface_y(),
                (self.min_z + self.max_z) * 0.5,
            ),
        }
    }

    /// Zone membership test. On-desk zones additionally require the point to
    /// be on the desk; [`Zone::OffTable`] delegates to the off-desk predicate.
    #[must_use]
    pub fn zone_contains(&self, zone: Zone, p: Vec3, inset: f32) -> bool {
        match self.zone_rect(zone, inset) {
            Some((min, max)) => {
                self.is_on_desk(p)
                    && p.x >= min[0]
                    && p.x <= max[0]
                    && p.z >= min[1]
                    && p.z <= max[1]
            }
            None => self.is_off_desk(p),
        }
    }
}

impl Default for DeskBounds {
    /// Unit desk centered at the origin.
    fn default() -> Self {
        Self::from_corners(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5))
    }
}

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

/// Named placement region on (or off) the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Left,
    Right,
    Corner,
    Center,
    OffTable,
}

impl Zone {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Corner => "corner",
            Self::Center => "center",
            Self::OffTable => "off_table",
        }
    }

    /// Match a zone mentioned in lowercased command text.
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        if text.contains("corner") {
            Some(Self::Corner)
        } else if text.contains("left") {
            Some(Self::Left)
        } else if text.contains("right") {
            Some(Self::Right)
        } else if text.contains("center") || text.contains("middle") {
            Some(Self::Center)
        } else if text.contains("off") || text.contains("away") || text.contains("bin") {
            Some(Self::OffTable)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
