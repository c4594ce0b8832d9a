//! Engine configuration, loadable from TOML.
//!
//! Every field carries a serde default so partial files work; `validate`
//! rejects values the simulation cannot run with.

use std::path::Path;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for the manipulation engine.
#[derive(Debug, Clone, Serialize, Deserialize, Resource)]
pub struct EngineConfig {
    /// Fixed simulation timestep in seconds.
    #[serde(default = "default_control_dt")]
    pub control_dt: f64,

    /// Catch-up step cap per rendered frame.
    #[serde(default = "default_max_steps_per_frame")]
    pub max_steps_per_frame: u32,

    /// Episode truncation limit.
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: u32,

    /// Gravity along -Y, in m/s^2 (positive magnitude).
    #[serde(default = "default_gravity")]
    pub gravity: f32,

    /// Margin between the desk edge and any placement zone, in meters.
    #[serde(default = "default_zone_inset")]
    pub zone_inset: f32,

    #[serde(default)]
    pub gripper: GripperConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub reward: RewardConfig,
}

fn default_control_dt() -> f64 {
    1.0 / 60.0
}
fn default_max_steps_per_frame() -> u32 {
    5
}
fn default_max_episode_steps() -> u32 {
    500
}
fn default_gravity() -> f32 {
    9.81
}
fn default_zone_inset() -> f32 {
    0.08
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            control_dt: default_control_dt(),
            max_steps_per_frame: default_max_steps_per_frame(),
            max_episode_steps: default_max_episode_steps(),
            gravity: default_gravity(),
            zone_inset: default_zone_inset(),
            gripper: GripperConfig::default(),
            executor: ExecutorConfig::default(),
            scan: ScanConfig::default(),
            reward: RewardConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_dt <= 0.0 || !self.control_dt.is_finite() {
            return Err(ConfigError::InvalidControlDt(self.control_dt));
        }
        if self.max_steps_per_frame == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_steps_per_frame".into(),
                message: "must be >= 1".into(),
            });
        }
        if self.max_episode_steps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_episode_steps".into(),
                message: "must be >= 1".into(),
            });
        }
        if self.zone_inset < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "zone_inset".into(),
                message: "must be >= 0".into(),
            });
        }
        self.gripper.validate()?;
        self.executor.validate()?;
        self.scan.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GripperConfig
// ---------------------------------------------------------------------------

/// Kinematic gripper tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GripperConfig {
    /// Travel speed in m/s while empty-handed.
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Travel speed in m/s while carrying; kept below `speed`.
    #[serde(default = "default_loaded_speed")]
    pub loaded_speed: f32,

    /// Lowest allowed gripper height.
    #[serde(default = "default_floor_y")]
    pub floor_y: f32,

    /// Arrival distance threshold in meters.
    #[serde(default = "default_arrive_eps")]
    pub arrive_eps: f32,

    /// Grasp acceptance radius; deliberately generous relative to object size.
    #[serde(default = "default_grasp_radius")]
    pub grasp_radius: f32,

    /// How far below the gripper a carried object rides.
    #[serde(default = "default_carry_offset")]
    pub carry_offset: f32,
}

fn default_speed() -> f32 {
    1.2
}
fn default_loaded_speed() -> f32 {
    0.6
}
fn default_floor_y() -> f32 {
    0.02
}
fn default_arrive_eps() -> f32 {
    0.01
}
fn default_grasp_radius() -> f32 {
    0.2
}
fn default_carry_offset() -> f32 {
    0.08
}

impl Default for GripperConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            loaded_speed: default_loaded_speed(),
            floor_y: default_floor_y(),
            arrive_eps: default_arrive_eps(),
            grasp_radius: default_grasp_radius(),
            carry_offset: default_carry_offset(),
        }
    }
}

impl GripperConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speed <= 0.0 || self.loaded_speed <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "gripper.speed".into(),
                message: "speeds must be > 0".into(),
            });
        }
        if self.loaded_speed > self.speed {
            return Err(ConfigError::InvalidValue {
                field: "gripper.loaded_speed".into(),
                message: "must not exceed gripper.speed".into(),
            });
        }
        if self.arrive_eps <= 0.0 || self.grasp_radius <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "gripper.arrive_eps".into(),
                message: "thresholds must be > 0".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ExecutorConfig
// ---------------------------------------------------------------------------

/// Task executor tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Consecutive failed grasp attempts before the task is abandoned.
    #[serde(default = "default_grasp_retry_ticks")]
    pub grasp_retry_ticks: u32,

    /// Sim-time seconds without gripper movement before stuck recovery.
    #[serde(default = "default_stuck_timeout")]
    pub stuck_timeout: f32,

    /// Movement below this per-tick distance counts as "not moving".
    #[serde(default = "default_stuck_eps")]
    pub stuck_eps: f32,

    /// Approach point height above the target object.
    #[serde(default = "default_approach_height")]
    pub approach_height: f32,
}

fn default_grasp_retry_ticks() -> u32 {
    60
}
fn default_stuck_timeout() -> f32 {
    1.5
}
fn default_stuck_eps() -> f32 {
    1e-4
}
fn default_approach_height() -> f32 {
    0.1
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            grasp_retry_ticks: default_grasp_retry_ticks(),
            stuck_timeout: default_stuck_timeout(),
            stuck_eps: default_stuck_eps(),
            approach_height: default_approach_height(),
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grasp_retry_ticks == 0 {
            return Err(ConfigError::InvalidValue {
                field: "executor.grasp_retry_ticks".into(),
                message: "must be >= 1".into(),
            });
        }
        if self.stuck_timeout <= 0.0 || self.stuck_eps <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "executor.stuck_timeout".into(),
                message: "stuck thresholds must be > 0".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScanConfig
// ---------------------------------------------------------------------------

/// Raycast surface scan tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Grid spacing between rays, in meters.
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f32,

    /// Minimum dot product between a hit normal and +Y to count as
    /// horizontal.
    #[serde(default = "default_min_up_dot")]
    pub min_up_dot: f32,

    /// Height-band bucket size for clustering hit points.
    #[serde(default = "default_band_height")]
    pub band_height: f32,

    /// Vertical padding applied to the winning band.
    #[serde(default = "default_vertical_pad")]
    pub vertical_pad: f32,

    /// Height rays are fired from.
    #[serde(default = "default_origin_height")]
    pub origin_height: f32,

    /// Scan rectangle min corner (x, z).
    #[serde(default = "default_rect_min")]
    pub rect_min: [f32; 2],

    /// Scan rectangle max corner (x, z).
    #[serde(default = "default_rect_max")]
    pub rect_max: [f32; 2],
}

fn default_grid_spacing() -> f32 {
    0.15
}
fn default_min_up_dot() -> f32 {
    0.85
}
fn default_band_height() -> f32 {
    0.5
}
fn default_vertical_pad() -> f32 {
    0.5
}
fn default_origin_height() -> f32 {
    10.0
}
fn default_rect_min() -> [f32; 2] {
    [-3.0, -3.0]
}
fn default_rect_max() -> [f32; 2] {
    [3.0, 3.0]
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            grid_spacing: default_grid_spacing(),
            min_up_dot: default_min_up_dot(),
            band_height: default_band_height(),
            vertical_pad: default_vertical_pad(),
            origin_height: default_origin_height(),
            rect_min: default_rect_min(),
            rect_max: default_rect_max(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_spacing <= 0.0 || self.band_height <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.grid_spacing".into(),
                message: "spacing and band height must be > 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_up_dot) {
            return Err(ConfigError::InvalidValue {
                field: "scan.min_up_dot".into(),
                message: "must be within [0, 1]".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RewardConfig
// ---------------------------------------------------------------------------

/// Scalar reward terms. Signs are baked into the values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "default_step_penalty")]
    pub step_penalty: f32,

    /// Terminal penalty when the gripper falls below the desk band.
    #[serde(default = "default_gripper_fell")]
    pub gripper_fell: f32,

    /// One-time credit when a trash object leaves the desk.
    #[serde(default = "default_trash_removed")]
    pub trash_removed: f32,

    /// Per-step credit for an item resting in its assigned zone.
    #[serde(default = "default_in_zone")]
    pub in_zone: f32,

    /// Per-step penalty for an item on the desk outside its zone.
    #[serde(default = "default_wrong_zone")]
    pub wrong_zone: f32,

    /// Per-step penalty for a non-trash item that fell off the desk.
    #[serde(default = "default_item_fell")]
    pub item_fell: f32,

    /// Terminal bonus when the full success condition holds.
    #[serde(default = "default_success_bonus")]
    pub success_bonus: f32,
}

fn default_step_penalty() -> f32 {
    -1.0
}
fn default_gripper_fell() -> f32 {
    -200.0
}
fn default_trash_removed() -> f32 {
    100.0
}
fn default_in_zone() -> f32 {
    50.0
}
fn default_wrong_zone() -> f32 {
    -10.0
}
fn default_item_fell() -> f32 {
    -50.0
}
fn default_success_bonus() -> f32 {
    500.0
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            step_penalty: default_step_penalty(),
            gripper_fell: default_gripper_fell(),
            trash_removed: default_trash_removed(),
            in_zone: default_in_zone(),
            wrong_zone: default_wrong_zone(),
            item_fell: default_item_fell(),
            success_bonus: default_success_bonus(),
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
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert!((config.control_dt - 1.0 / 60.0).abs() < 1e-12);
        assert_eq!(config.max_episode_steps, 500);
        assert!((config.reward.trash_removed - 100.0).abs() < 1e-6);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            max_episode_steps = 200

            [gripper]
            speed = 2.0
            loaded_speed = 1.0

            [scan]
            grid_spacing = 0.1
        "#;
        let config = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.max_episode_steps, 200);
        assert!((config.gripper.speed - 2.0).abs() < 1e-6);
        assert!((config.scan.grid_spacing - 0.1).abs() < 1e-6);
        // Untouched sections keep defaults.
        assert!((config.executor.stuck_timeout - 1.5).abs() < 1e-6);
    }

    #[test]
    fn invalid_control_dt_rejected() {
        let result = EngineConfig::from_toml_str("control_dt = 0.0");
        assert!(matches!(result, Err(ConfigError::InvalidControlDt(_))));
    }

    #[test]
    fn loaded_speed_above_speed_rejected() {
        let toml = r#"
            [gripper]
            speed = 0.5
            loaded_speed = 1.0
        "#;
        let result = EngineConfig::from_toml_str(toml);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field, .. }) if field == "gripper.loaded_speed"
        ));
    }

    #[test]
    fn bad_min_up_dot_rejected() {
        let toml = r#"
            [scan]
            min_up_dot = 1.5
        "#;
        assert!(EngineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = EngineConfig::from_toml_str("max_episode_steps = \"many\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = EngineConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back = EngineConfig::from_toml_str(&text).unwrap();
        assert!((back.gripper.grasp_radius - config.gripper.grasp_radius).abs() < 1e-6);
        assert_eq!(back.max_steps_per_frame, config.max_steps_per_frame);
    }
}
