use std::io;

use thiserror::Error;

/// Result type used across the predicate core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Canonical error representation shared by the predicate crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("general error: {0}")]
    GeneralError(String),
}

impl CoreError {
    /// Whether the failure was caused by client input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidFilter(_) | CoreError::DeserializationError(_)
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::DeserializationError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for environment variable {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for CoreError {
    fn from(value: ConfigError) -> Self {
        CoreError::ConfigError(value.to_string())
    }
}
