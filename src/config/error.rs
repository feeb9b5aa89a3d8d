//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind host")]
    InvalidHost,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Request timeout must not be shorter than the oracle timeout")]
    RequestTimeoutTooShort,

    #[error("Invalid oracle timeout")]
    InvalidOracleTimeout,

    #[error("Patient turn limit must be at least 1")]
    InvalidTurnLimit,

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,
}
