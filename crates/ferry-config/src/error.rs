//! Error types for configuration operations.
//!
//! # Design
//! - Constant messages; the offending variable and value travel as fields.
//! - Every variant is fatal for a run: nothing is uploaded when settings are invalid.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set (or was blank).
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: &'static str,
    },
    /// A variable contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Variable that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// The configured private key does not exist or is not a regular file.
    #[error("private key not found")]
    KeyNotFound {
        /// Resolved key path.
        path: PathBuf,
    },
    /// The dotenv file exists but could not be read or parsed.
    #[error("environment file unreadable")]
    EnvFile {
        /// Path of the dotenv file.
        path: PathBuf,
        /// Underlying dotenvy error.
        source: dotenvy::Error,
    },
    /// File system inspection failed while validating settings.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        field: &'static str,
        reason: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: Some(value.into()),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
