//! Run-scoped span helpers.
//!
//! # Design
//! - Every event emitted while a run is active carries the run id and mode.
//! - The guard owns the entered span, so it must be created on the thread doing the work.

use tracing::span::EnteredSpan;

use crate::init::build_version;

/// Guard that keeps the run span entered for its lifetime.
pub struct RunContextGuard {
    _entered: EnteredSpan,
}

impl RunContextGuard {
    /// Enter a `run` span tagged with the run identifier and execution mode.
    #[must_use]
    pub fn enter(run_id: &str, mode: &str) -> Self {
        let span = tracing::info_span!(
            "run",
            run_id = %run_id,
            mode = %mode,
            version = %build_version()
        );
        Self {
            _entered: span.entered(),
        }
    }
}
