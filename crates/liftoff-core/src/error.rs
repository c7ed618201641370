//! Error types for Liftoff

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using LiftoffError
pub type Result<T> = std::result::Result<T, LiftoffError>;

/// Main error type for Liftoff operations
#[derive(Debug, Error)]
pub enum LiftoffError {
    /// Variant decoding errors
    #[error(transparent)]
    Variant(#[from] VariantError),

    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Run context errors
    #[error(transparent)]
    Context(#[from] ContextError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while decoding a build variant
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VariantError {
    /// Variant does not start with a known architecture
    #[error("Unsupported architecture in variant '{0}'")]
    UnsupportedArchitecture(String),

    /// Build type has no known classification
    #[error("Unsupported build type '{build_type}' in variant '{variant}'")]
    UnsupportedBuildType { variant: String, build_type: String },
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while freezing the run context
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A required run parameter was not supplied
    #[error("Missing run parameter: {0}")]
    MissingParameter(&'static str),

    /// Date string could not be parsed
    #[error("Invalid date '{0}': expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate(String),

    /// Trust level outside the supported range
    #[error("Invalid trust level {0}: must be 1, 2 or 3")]
    InvalidTrustLevel(u8),
}
