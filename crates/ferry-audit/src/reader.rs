//! Read an audit log back into typed records.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{AuditError, AuditResult};
use crate::model::{Counts, LogRecord, RunSummary, TransferRecord};

/// Parsed contents of one audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Transfer outcomes in file order.
    pub records: Vec<TransferRecord>,
    /// Summary line, absent when the run was interrupted.
    pub summary: Option<RunSummary>,
}

impl AuditReport {
    /// Whether the run reached its summary line.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    /// Tallies recomputed from the transfer records.
    #[must_use]
    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for record in &self.records {
            counts.record(record);
        }
        counts
    }
}

/// Parse the log at `path`. Blank lines are ignored.
///
/// # Errors
///
/// Returns `AuditError::Io` when the file cannot be read,
/// `AuditError::Decode` for an undecodable line, and `AuditError::Malformed`
/// when anything follows the summary line.
pub fn read_log(path: &Path) -> AuditResult<AuditReport> {
    let file = File::open(path).map_err(|err| AuditError::io("audit.open", path, err))?;
    let mut report = AuditReport::default();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|err| AuditError::io("audit.read", path, err))?;
        if line.trim().is_empty() {
            continue;
        }
        if report.summary.is_some() {
            return Err(AuditError::Malformed {
                path: path.to_path_buf(),
                line: line_number,
                reason: "record_after_summary",
            });
        }
        let record: LogRecord =
            serde_json::from_str(&line).map_err(|source| AuditError::Decode {
                path: path.to_path_buf(),
                line: line_number,
                source,
            })?;
        match record {
            LogRecord::File(record) => report.records.push(record),
            LogRecord::RunEnd(summary) => report.summary = Some(summary),
        }
    }
    Ok(report)
}
