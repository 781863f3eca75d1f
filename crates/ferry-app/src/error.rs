//! # Design
//!
//! - Centralize run-fatal errors; per-candidate failures never surface here.
//! - Keep error messages constant while carrying context fields for debugging.
//! - `is_configuration` drives the CLI exit code split.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings failed validation.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: ferry_config::ConfigError,
    },
    /// The local root or pattern was unusable.
    #[error("candidate discovery failed")]
    Discovery {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: ferry_fsops::FsOpsError,
    },
    /// The remote session could not be established or prepared.
    #[error("remote operation failed")]
    Remote {
        /// Operation identifier.
        operation: &'static str,
        /// Source remote error.
        source: ferry_remote::RemoteError,
    },
    /// The audit trail could not be written.
    #[error("audit log operation failed")]
    Audit {
        /// Operation identifier.
        operation: &'static str,
        /// Source audit error.
        source: ferry_audit::AuditError,
    },
    /// The blocking pipeline task panicked or was cancelled.
    #[error("upload task failed")]
    Join {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: ferry_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn discovery(
        operation: &'static str,
        source: ferry_fsops::FsOpsError,
    ) -> Self {
        Self::Discovery { operation, source }
    }

    pub(crate) const fn remote(
        operation: &'static str,
        source: ferry_remote::RemoteError,
    ) -> Self {
        Self::Remote { operation, source }
    }

    pub(crate) const fn audit(operation: &'static str, source: ferry_audit::AuditError) -> Self {
        Self::Audit { operation, source }
    }

    /// Whether the failure stems from configuration rather than the environment.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Discovery { .. })
    }
}
