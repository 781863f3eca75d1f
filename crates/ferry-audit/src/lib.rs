#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Per-run JSON-lines audit trail: one line per transfer outcome, then a summary.

pub mod error;
pub mod model;
pub mod reader;
pub mod writer;

pub use error::{AuditError, AuditResult};
pub use model::{
    Counts, LogRecord, RecordTarget, RelocationRecord, RunConfigSnapshot, RunStatus, RunSummary,
    TransferRecord, TransferStatus,
};
pub use reader::{AuditReport, read_log};
pub use writer::AuditLog;
