//! Post-upload relocation of local files.
//!
//! # Design
//! - The only place that mutates the local source tree.
//! - Moves preserve the relative path under the sent directory and never overwrite.
//! - Cross-filesystem moves fall back to copy then remove.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::{Relocation, RelocationMode, UploadCandidate};

const COLLISION_STAMP: &str = "%Y%m%d_%H%M%S";
const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Applies the configured [`RelocationMode`] to uploaded files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocator {
    mode: RelocationMode,
}

impl Relocator {
    /// Build a relocator for `mode`.
    #[must_use]
    pub const fn new(mode: RelocationMode) -> Self {
        Self { mode }
    }

    /// Relocate `candidate` using the local clock for collision suffixes.
    ///
    /// # Errors
    ///
    /// Returns `FsOpsError::Io` when the move or delete fails.
    pub fn relocate(&self, candidate: &UploadCandidate) -> FsOpsResult<Relocation> {
        self.relocate_at(candidate, Local::now())
    }

    /// Relocate `candidate`, stamping any collision rename with `now`.
    ///
    /// # Errors
    ///
    /// Returns `FsOpsError::Io` when the move or delete fails and
    /// `FsOpsError::InvalidInput` when no free destination name exists.
    pub fn relocate_at(
        &self,
        candidate: &UploadCandidate,
        now: DateTime<Local>,
    ) -> FsOpsResult<Relocation> {
        match &self.mode {
            RelocationMode::Keep => {
                debug!(candidate = %candidate.relative_path, "keeping local file");
                Ok(Relocation::Kept)
            }
            RelocationMode::Delete => {
                fs::remove_file(&candidate.local_path).map_err(|err| {
                    FsOpsError::io("relocate.delete", &candidate.local_path, err)
                })?;
                info!(candidate = %candidate.relative_path, "deleted local file");
                Ok(Relocation::Deleted)
            }
            RelocationMode::Move { sent_dir } => {
                let target = sent_dir.join(&candidate.relative_path);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|err| FsOpsError::io("relocate.create_parent", parent, err))?;
                }
                let destination = free_destination(&target, now)?;
                move_file(&candidate.local_path, &destination)?;
                info!(
                    candidate = %candidate.relative_path,
                    destination = %destination.display(),
                    "moved local file to sent directory"
                );
                Ok(Relocation::Moved { destination })
            }
        }
    }
}

/// Pick `target`, or a timestamp-suffixed sibling when `target` is taken.
fn free_destination(target: &Path, now: DateTime<Local>) -> FsOpsResult<PathBuf> {
    if !exists(target)? {
        return Ok(target.to_path_buf());
    }
    let stem = target
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = target
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let stamp = now.format(COLLISION_STAMP);

    let stamped = target.with_file_name(format!("{stem}_{stamp}{extension}"));
    if !exists(&stamped)? {
        return Ok(stamped);
    }
    for counter in 1..=MAX_COLLISION_SUFFIX {
        let numbered = target.with_file_name(format!("{stem}_{stamp}_{counter}{extension}"));
        if !exists(&numbered)? {
            return Ok(numbered);
        }
    }
    Err(FsOpsError::InvalidInput {
        field: "sent_destination",
        reason: "collision_suffixes_exhausted",
        value: Some(target.display().to_string()),
    })
}

fn exists(path: &Path) -> FsOpsResult<bool> {
    path.try_exists()
        .map_err(|err| FsOpsError::io("relocate.stat_destination", path, err))
}

fn move_file(source: &Path, destination: &Path) -> FsOpsResult<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(rename_err) if rename_err.kind() == io::ErrorKind::NotFound => {
            Err(FsOpsError::io("relocate.rename", source, rename_err))
        }
        Err(_rename_err) => {
            fs::copy(source, destination)
                .map_err(|err| FsOpsError::io("relocate.copy", destination, err))?;
            fs::remove_file(source).map_err(|err| FsOpsError::io("relocate.cleanup", source, err))
        }
    }
}
