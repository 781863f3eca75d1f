//! # Design
//!
//! - Audit failures are fatal to a run, so every variant names the file involved.
//! - Parse failures report the 1-based line number.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for audit log operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors raised while writing or reading audit logs.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Filesystem failure on the log directory or file.
    #[error("audit io failure")]
    Io {
        /// Operation that failed.
        operation: &'static str,
        /// File or directory involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A record could not be encoded as JSON.
    #[error("audit record encoding failed")]
    Encode {
        /// Log file being written.
        path: PathBuf,
        /// Underlying serializer error.
        source: serde_json::Error,
    },
    /// A line could not be decoded.
    #[error("audit record decoding failed")]
    Decode {
        /// Log file being read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Underlying deserializer error.
        source: serde_json::Error,
    },
    /// The log structure is inconsistent.
    #[error("audit log malformed")]
    Malformed {
        /// Log file being read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Static reason for the failure.
        reason: &'static str,
    },
}

impl AuditError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
