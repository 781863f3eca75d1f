//! Records persisted to the audit trail.
//!
//! # Design
//! - `LogRecord` is internally tagged by `event`, so each JSON line is self-describing.
//! - `TransferRecord` constructors enforce "error present iff failed".
//! - Timestamps are UTC RFC 3339.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const UNKNOWN_ERROR: &str = "unknown error";

/// Terminal classification of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Copied and verified (or simulated in dry-run).
    Uploaded,
    /// Already present remotely and overwrite was disabled.
    Skipped,
    /// Any failure before the upload was confirmed.
    Failed,
}

impl TransferStatus {
    /// Stable label used in logs and tallies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Where a candidate lives locally and remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    /// Absolute local path.
    pub local_path: PathBuf,
    /// Path relative to the local root.
    pub relative_path: String,
    /// Destination path on the remote host.
    pub remote_path: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Relocation applied to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationRecord {
    /// `moved`, `deleted`, or `kept`.
    pub action: String,
    /// Destination for moved files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
}

/// Outcome of one candidate, written as an `event: "file"` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Completion time.
    pub ts: DateTime<Utc>,
    /// Absolute local path.
    pub local_path: PathBuf,
    /// Path relative to the local root.
    pub relative_path: String,
    /// Destination path on the remote host.
    pub remote_path: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Content digest when hashing succeeded.
    pub sha256: Option<String>,
    /// Terminal status.
    pub status: TransferStatus,
    /// Failure reason; present iff `status` is `failed`.
    pub error: Option<String>,
    /// Dry-run outcome with no remote or local side effects.
    pub simulated: bool,
    /// Relocation applied after upload.
    pub relocation: Option<RelocationRecord>,
    /// Relocation failure; the upload itself still succeeded.
    pub relocation_error: Option<String>,
}

impl TransferRecord {
    fn base(target: RecordTarget, status: TransferStatus, sha256: Option<String>) -> Self {
        Self {
            ts: Utc::now(),
            local_path: target.local_path,
            relative_path: target.relative_path,
            remote_path: target.remote_path,
            size_bytes: target.size_bytes,
            sha256,
            status,
            error: None,
            simulated: false,
            relocation: None,
            relocation_error: None,
        }
    }

    /// Uploaded outcome; `simulated` marks dry-run records.
    #[must_use]
    pub fn uploaded(target: RecordTarget, sha256: String, simulated: bool) -> Self {
        Self {
            simulated,
            ..Self::base(target, TransferStatus::Uploaded, Some(sha256))
        }
    }

    /// Skipped outcome; the digest may be missing when hashing failed.
    #[must_use]
    pub fn skipped(target: RecordTarget, sha256: Option<String>) -> Self {
        Self::base(target, TransferStatus::Skipped, sha256)
    }

    /// Failed outcome; a blank error is replaced with a placeholder.
    #[must_use]
    pub fn failed(target: RecordTarget, sha256: Option<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            error
        };
        Self {
            error: Some(error),
            ..Self::base(target, TransferStatus::Failed, sha256)
        }
    }

    /// Attach the relocation applied after upload.
    #[must_use]
    pub fn with_relocation(mut self, relocation: RelocationRecord) -> Self {
        self.relocation = Some(relocation);
        self
    }

    /// Attach a relocation failure.
    #[must_use]
    pub fn with_relocation_error(mut self, error: impl Into<String>) -> Self {
        self.relocation_error = Some(error.into());
        self
    }
}

/// Overall run classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every candidate uploaded or skipped.
    Ok,
    /// At least one candidate failed.
    PartialFail,
    /// Discovery found nothing.
    NoFiles,
}

impl RunStatus {
    /// Stable label used in logs and tallies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::PartialFail => "partial_fail",
            Self::NoFiles => "no_files",
        }
    }
}

/// Per-status tallies for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Candidates processed.
    pub total: u64,
    /// Uploaded candidates (simulated included).
    pub uploaded: u64,
    /// Skipped candidates.
    pub skipped: u64,
    /// Failed candidates.
    pub failed: u64,
    /// Uploaded candidates whose relocation failed.
    pub relocation_warnings: u64,
}

impl Counts {
    /// Fold one outcome into the tallies.
    pub const fn record(&mut self, record: &TransferRecord) {
        self.total += 1;
        match record.status {
            TransferStatus::Uploaded => self.uploaded += 1,
            TransferStatus::Skipped => self.skipped += 1,
            TransferStatus::Failed => self.failed += 1,
        }
        if record.relocation_error.is_some() {
            self.relocation_warnings += 1;
        }
    }

    /// Overall status implied by the tallies.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        if self.total == 0 {
            RunStatus::NoFiles
        } else if self.failed > 0 {
            RunStatus::PartialFail
        } else {
            RunStatus::Ok
        }
    }
}

/// Effective configuration captured in the summary line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfigSnapshot {
    /// Remote host.
    pub host: String,
    /// Remote SSH port.
    pub port: u16,
    /// Remote user.
    pub user: String,
    /// Remote base directory.
    pub remote_dir: String,
    /// Local source directory.
    pub local_dir: PathBuf,
    /// Upload glob.
    pub pattern: String,
    /// Whether discovery descended into subdirectories.
    pub recursive: bool,
    /// Whether existing remote files were replaced.
    pub overwrite: bool,
    /// Whether the run was simulated.
    pub dry_run: bool,
    /// Relocation mode label.
    pub relocation: String,
    /// Sent directory.
    pub sent_dir: PathBuf,
}

/// Final `event: "run_end"` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Run start time.
    pub started_at: DateTime<Utc>,
    /// Run end time.
    pub finished_at: DateTime<Utc>,
    /// Overall status.
    pub status: RunStatus,
    /// Per-status tallies.
    pub counts: Counts,
    /// Effective configuration.
    pub config: RunConfigSnapshot,
    /// Path of the log file holding this summary.
    pub log_file: PathBuf,
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogRecord {
    /// Per-candidate outcome.
    File(TransferRecord),
    /// Run summary.
    RunEnd(RunSummary),
}
