use thiserror::Error;

/// Top-level error type for the deskbot workspace.
#[derive(Debug, Error)]
pub enum DeskbotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid control_dt: {0} (must be > 0)")]
    InvalidControlDt(f64),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Surface calibration failures.
///
/// Calibration runs once per reset; a failure aborts the reset and is not
/// retryable with identical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CalibrationError {
    #[error("No horizontal surface found after {rays_cast} rays")]
    NoSurfaceFound { rays_cast: usize },

    #[error("Empty scan rectangle: min must be strictly below max on both axes")]
    EmptyScanRect,
}

/// Visual asset resolution failures.
///
/// Absorbed at the spawn boundary by the primitive fallback; never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("Model asset '{0}' failed to load")]
    LoadFailed(String),
}

/// Action validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action contains NaN")]
    ActionContainsNan,

    #[error("Action contains Inf")]
    ActionContainsInf,
}
