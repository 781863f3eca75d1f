//! Append-only JSONL writer, one file per run.
//!
//! # Design
//! - Files are created with create-new semantics; an existing name gets a `_N` suffix.
//! - Each record is written as a single line and flushed before returning.
//! - `finish` consumes the writer, so nothing can follow the summary line.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::{AuditError, AuditResult};
use crate::model::{LogRecord, RunSummary, TransferRecord};

const FILE_PREFIX: &str = "upload_";
const FILE_EXTENSION: &str = "jsonl";
const FILE_STAMP: &str = "%Y%m%d_%H%M%S";
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Open audit log for the current run.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: File,
    records: u64,
}

impl AuditLog {
    /// Create the log directory if needed and open a fresh log named after `started_at`.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Io` when the directory or file cannot be created.
    pub fn create(dir: &Path, started_at: DateTime<Local>) -> AuditResult<Self> {
        fs::create_dir_all(dir).map_err(|err| AuditError::io("audit.create_dir", dir, err))?;
        let stem = format!("{FILE_PREFIX}{}", started_at.format(FILE_STAMP));

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{stem}.{FILE_EXTENSION}")
            } else {
                format!("{stem}_{attempt}.{FILE_EXTENSION}")
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    debug!(path = %path.display(), "audit log opened");
                    return Ok(Self {
                        path,
                        file,
                        records: 0,
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(AuditError::io("audit.create_file", &path, err)),
            }
        }
        Err(AuditError::io(
            "audit.create_file",
            dir,
            io::Error::new(io::ErrorKind::AlreadyExists, "no free audit log name"),
        ))
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of transfer records written so far.
    #[must_use]
    pub const fn records(&self) -> u64 {
        self.records
    }

    /// Append one transfer outcome.
    ///
    /// # Errors
    ///
    /// Returns an `AuditError` when encoding or writing fails.
    pub fn record(&mut self, record: &TransferRecord) -> AuditResult<()> {
        self.write_line(&LogRecord::File(record.clone()))?;
        self.records += 1;
        Ok(())
    }

    /// Append the run summary and close the log.
    ///
    /// # Errors
    ///
    /// Returns an `AuditError` when encoding, writing, or syncing fails.
    pub fn finish(mut self, summary: &RunSummary) -> AuditResult<PathBuf> {
        self.write_line(&LogRecord::RunEnd(summary.clone()))?;
        self.file
            .sync_all()
            .map_err(|err| AuditError::io("audit.sync", &self.path, err))?;
        debug!(path = %self.path.display(), records = self.records, "audit log finished");
        Ok(self.path)
    }

    fn write_line(&mut self, record: &LogRecord) -> AuditResult<()> {
        let mut line = serde_json::to_vec(record).map_err(|source| AuditError::Encode {
            path: self.path.clone(),
            source,
        })?;
        line.push(b'\n');
        self.file
            .write_all(&line)
            .and_then(|()| self.file.flush())
            .map_err(|err| AuditError::io("audit.write", &self.path, err))
    }
}
