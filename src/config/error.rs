//! Configuration Error Types
//!
//! Specific, actionable errors for configuration loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Configuration file not found at expected locations
    #[error("Configuration file not found. Searched paths: {searched_paths:?}")]
    ConfigFileNotFound { searched_paths: Vec<PathBuf> },

    /// Invalid YAML syntax in configuration file
    #[error("Invalid YAML in configuration file '{file_path}': {error}")]
    InvalidYaml { file_path: String, error: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },

    /// File I/O errors during configuration loading
    #[error("Failed to read configuration file '{file_path}': {error}")]
    FileReadError { file_path: String, error: String },

    /// Environment variable override errors
    #[error("Environment override error for key {key}: {reason}")]
    EnvironmentOverrideError { key: String, reason: String },

    /// Configuration validation errors
    #[error("Configuration validation failed: {error}")]
    ValidationError { error: String },
}

impl ConfigurationError {
    pub fn config_file_not_found(searched_paths: Vec<PathBuf>) -> Self {
        Self::ConfigFileNotFound { searched_paths }
    }

    pub fn invalid_yaml<P: Into<String>, E: std::fmt::Display>(file_path: P, error: E) -> Self {
        Self::InvalidYaml {
            file_path: file_path.into(),
            error: error.to_string(),
        }
    }

    pub fn invalid_value<F: Into<String>, V: Into<String>, C: Into<String>>(
        field: F,
        value: V,
        context: C,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }

    pub fn file_read_error<P: Into<String>, E: std::fmt::Display>(file_path: P, error: E) -> Self {
        Self::FileReadError {
            file_path: file_path.into(),
            error: error.to_string(),
        }
    }

    pub fn environment_override_error<K: Into<String>, R: Into<String>>(key: K, reason: R) -> Self {
        Self::EnvironmentOverrideError {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn validation_error<E: std::fmt::Display>(error: E) -> Self {
        Self::ValidationError {
            error: error.to_string(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigurationError>;
