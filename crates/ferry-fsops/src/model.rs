//! Data carriers shared by discovery, hashing, and relocation.

use std::path::PathBuf;

/// A local file eligible for upload in the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    /// Absolute path to the file.
    pub local_path: PathBuf,
    /// Path relative to the discovery root, `/`-separated.
    pub relative_path: String,
    /// File size observed at discovery time.
    pub size_bytes: u64,
}

impl UploadCandidate {
    /// Parent portion of the relative path, when the file is nested.
    #[must_use]
    pub fn relative_parent(&self) -> Option<&str> {
        self.relative_path
            .rsplit_once('/')
            .map(|(parent, _)| parent)
            .filter(|parent| !parent.is_empty())
    }
}

/// What happens to a local file after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationMode {
    /// Move into the sent directory, preserving the relative path.
    Move {
        /// Destination root for moved files.
        sent_dir: PathBuf,
    },
    /// Remove the local file.
    Delete,
    /// Leave the local file in place.
    Keep,
}

impl RelocationMode {
    /// Stable label used in logs and the run summary.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Delete => "delete",
            Self::Keep => "keep",
        }
    }
}

/// Result of relocating a single uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    /// File now lives at `destination`.
    Moved {
        /// Final path inside the sent directory.
        destination: PathBuf,
    },
    /// File was removed.
    Deleted,
    /// File was left untouched.
    Kept,
}

impl Relocation {
    /// Action label recorded in the audit trail.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Moved { .. } => "moved",
            Self::Deleted => "deleted",
            Self::Kept => "kept",
        }
    }

    /// Destination path for moved files.
    #[must_use]
    pub const fn destination(&self) -> Option<&PathBuf> {
        match self {
            Self::Moved { destination } => Some(destination),
            Self::Deleted | Self::Kept => None,
        }
    }
}
