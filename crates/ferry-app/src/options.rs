//! Per-run behaviour switches supplied by the caller.

use std::path::Path;

use ferry_fsops::RelocationMode;

/// Run-time switches that do not come from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Descend into subdirectories of the local root.
    pub recursive: bool,
    /// Simulate: no copy, no remote mutation, no relocation.
    pub dry_run: bool,
    /// Replace files that already exist remotely.
    pub overwrite: bool,
    /// What to do with local files after upload.
    pub relocation: RelocationMode,
}

impl RunOptions {
    /// Label for the run span.
    #[must_use]
    pub const fn mode_label(&self) -> &'static str {
        if self.dry_run { "dry_run" } else { "upload" }
    }
}

/// Resolve relocation flags; `delete_after` wins over `keep_local`, and moving is the default.
#[must_use]
pub fn relocation_mode(keep_local: bool, delete_after: bool, sent_dir: &Path) -> RelocationMode {
    if delete_after {
        RelocationMode::Delete
    } else if keep_local {
        RelocationMode::Keep
    } else {
        RelocationMode::Move {
            sent_dir: sent_dir.to_path_buf(),
        }
    }
}
