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

//! Ferry application wiring.
//!
//! Layout: `bootstrap.rs` (entry points), `orchestrator.rs` (per-candidate upload loop),
//! `options.rs` (run switches).

/// Entry points and connector wiring.
pub mod bootstrap;
/// Application error types.
pub mod error;
/// Run switches.
pub mod options;
/// Sequential upload orchestration.
pub mod orchestrator;

pub use bootstrap::{run_upload, run_with};
pub use error::{AppError, AppResult};
pub use options::{RunOptions, relocation_mode};
pub use orchestrator::UploadOrchestrator;
