//! Error types for the layout engine and its settings store.

use std::path::PathBuf;
use thiserror::Error;

/// A layout parameter outside its accepted range.
///
/// Raised by `LayoutConfig::validate` and never repaired silently.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("theta must be positive and finite, got {0}")]
    Theta(f64),

    #[error("distance_min must be finite and >= 0, got {0}")]
    DistanceMin(f64),

    #[error("distance_max ({max}) must be greater than distance_min ({min})")]
    DistanceRange { min: f64, max: f64 },

    #[error("alpha_decay must lie in (0, 1), got {0}")]
    AlphaDecay(f64),

    #[error("alpha_min must lie in (0, 1), got {0}")]
    AlphaMin(f64),

    #[error("velocity_decay must lie in [0, 1], got {0}")]
    VelocityDecay(f64),

    #[error("bounce must lie in [0, 1), got {0}")]
    Bounce(f64),

    #[error("alpha must be finite and lie in (0, 1], got {0}")]
    Alpha(f64),

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("{name} must be >= 0, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("boundary {width}x{height} leaves no room inside a margin of {margin}")]
    Boundary { margin: f64, width: f64, height: f64 },
}

/// Errors reported by the layout engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("node {0} has a non-finite position, velocity or strength")]
    NonFiniteNode(String),

    #[error("edge {from} -> {to} has weight {weight} outside [0, 1]")]
    EdgeWeight { from: String, to: String, weight: f64 },

    /// `step` or `reheat` was called before `initialize`.
    #[error("layout engine is idle; call initialize first")]
    NotInitialized,
}

/// Errors while reading or writing persisted settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not determine a config directory")]
    NoConfigDir,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no preset named {0:?}")]
    UnknownPreset(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
