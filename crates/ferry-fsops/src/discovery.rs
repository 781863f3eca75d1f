//! Candidate discovery under a local root.
//!
//! # Design
//! - Patterns without `/` match the file name; patterns with `/` match the
//!   relative path and `*` never crosses a separator.
//! - Symlinks are never followed and only regular files are yielded.
//! - Excluded directories are resolved on every enumeration and pruned before descent,
//!   so relocated files and audit logs are never rediscovered.
//! - Unreadable subdirectories are logged and skipped; the root itself must be readable.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::UploadCandidate;

/// Inputs for a discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Directory to scan.
    pub root: PathBuf,
    /// Glob selecting candidates.
    pub pattern: String,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Directories pruned from the walk when they sit under the root.
    pub excluded: Vec<PathBuf>,
}

/// Compiled upload pattern.
#[derive(Debug, Clone)]
struct PatternMatcher {
    matcher: GlobMatcher,
    match_relative: bool,
}

impl PatternMatcher {
    fn compile(pattern: &str) -> FsOpsResult<Self> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|err| FsOpsError::glob("discovery.compile_pattern", pattern.to_string(), err))?;
        Ok(Self {
            matcher: glob.compile_matcher(),
            match_relative: pattern.contains('/'),
        })
    }

    fn is_match(&self, relative_path: &str) -> bool {
        if self.match_relative {
            return self.matcher.is_match(relative_path);
        }
        let name = relative_path
            .rsplit_once('/')
            .map_or(relative_path, |(_, name)| name);
        self.matcher.is_match(name)
    }
}

/// Validated discovery configuration; re-enumerable via [`Discovery::candidates`].
#[derive(Debug, Clone)]
pub struct Discovery {
    root: PathBuf,
    matcher: PatternMatcher,
    recursive: bool,
    excluded: Vec<PathBuf>,
}

impl Discovery {
    /// Validate the root and compile the pattern.
    ///
    /// # Errors
    ///
    /// Returns `FsOpsError::InvalidRoot` when the root is missing, not a
    /// directory, or unreadable, and `FsOpsError::Glob` for an invalid pattern.
    pub fn new(options: DiscoveryOptions) -> FsOpsResult<Self> {
        let root = validate_root(&options.root)?;
        let matcher = PatternMatcher::compile(&options.pattern)?;
        Ok(Self {
            root,
            matcher,
            recursive: options.recursive,
            excluded: options.excluded,
        })
    }

    /// Canonical root used for relative paths.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate matching files sorted by relative path.
    ///
    /// # Errors
    ///
    /// Returns `FsOpsError::InvalidRoot` when the root disappeared or became
    /// unreadable since construction.
    pub fn candidates(&self) -> FsOpsResult<Candidates> {
        validate_root(&self.root)?;
        let excluded = self.resolved_exclusions();
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_excluded(&excluded, entry));

        let mut found = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = FsOpsError::walkdir("discovery.walk", path, err);
                    warn!(error = ?error, "skipping unreadable entry during discovery");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(candidate) = self.candidate_for(&entry) {
                found.push(candidate);
            }
        }

        found.sort_by(|left, right| left.relative_path.cmp(&right.relative_path));
        debug!(root = %self.root.display(), count = found.len(), "discovery finished");
        Ok(Candidates {
            inner: found.into_iter(),
        })
    }

    /// Excluded directories that currently exist strictly under the root.
    fn resolved_exclusions(&self) -> Vec<PathBuf> {
        self.excluded
            .iter()
            .filter_map(|dir| fs::canonicalize(dir).ok())
            .filter(|dir| dir.starts_with(&self.root) && dir != &self.root)
            .collect()
    }

    fn candidate_for(&self, entry: &DirEntry) -> Option<UploadCandidate> {
        let Some(relative_path) = relative_string(&self.root, entry.path()) else {
            warn!(path = %entry.path().display(), "skipping file with a non UTF-8 path");
            return None;
        };
        if !self.matcher.is_match(&relative_path) {
            return None;
        }
        match entry.metadata() {
            Ok(metadata) => Some(UploadCandidate {
                local_path: entry.path().to_path_buf(),
                relative_path,
                size_bytes: metadata.len(),
            }),
            Err(err) => {
                let error = FsOpsError::walkdir("discovery.metadata", entry.path(), err);
                warn!(error = ?error, "skipping file without readable metadata");
                None
            }
        }
    }
}

/// Iterator over discovered candidates in relative-path order.
#[derive(Debug)]
pub struct Candidates {
    inner: std::vec::IntoIter<UploadCandidate>,
}

impl Iterator for Candidates {
    type Item = UploadCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Candidates {}

fn is_excluded(excluded: &[PathBuf], entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && excluded.iter().any(|dir| dir == entry.path())
}

fn validate_root(root: &Path) -> FsOpsResult<PathBuf> {
    let invalid = |reason| FsOpsError::InvalidRoot {
        path: root.to_path_buf(),
        reason,
    };
    let canonical = fs::canonicalize(root).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => invalid("not_found"),
        _ => invalid("unreadable"),
    })?;
    if !canonical.is_dir() {
        return Err(invalid("not_a_directory"));
    }
    fs::read_dir(&canonical).map_err(|_| invalid("unreadable"))?;
    Ok(canonical)
}

fn relative_string(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_patterns_ignore_directories() -> FsOpsResult<()> {
        let matcher = PatternMatcher::compile("*.csv")?;
        assert!(matcher.is_match("a.csv"));
        assert!(matcher.is_match("nested/deep/b.csv"));
        assert!(!matcher.is_match("notes.txt"));
        Ok(())
    }

    #[test]
    fn path_patterns_respect_separators() -> FsOpsResult<()> {
        let single = PatternMatcher::compile("in/*.csv")?;
        assert!(single.is_match("in/a.csv"));
        assert!(!single.is_match("in/deep/a.csv"));

        let any_depth = PatternMatcher::compile("in/**/*.csv")?;
        assert!(any_depth.is_match("in/deep/a.csv"));
        assert!(any_depth.is_match("in/a.csv"));
        Ok(())
    }

    #[test]
    fn invalid_pattern_is_a_glob_error() {
        assert!(matches!(
            PatternMatcher::compile("[unterminated"),
            Err(FsOpsError::Glob { .. })
        ));
    }

    #[test]
    fn relative_string_joins_with_forward_slashes() {
        let root = Path::new("/data/root");
        assert_eq!(
            relative_string(root, &root.join("a").join("b.csv")).as_deref(),
            Some("a/b.csv")
        );
        assert_eq!(relative_string(root, Path::new("/elsewhere/x")), None);
    }
}
