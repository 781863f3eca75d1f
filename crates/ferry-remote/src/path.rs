//! Remote path arithmetic. Remote paths are always `/`-separated strings.

/// Join the remote base directory and a relative path with exactly one `/`.
#[must_use]
pub fn join_remote(base: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    let base = base.trim_end_matches('/');
    format!("{base}/{relative}")
}

/// Parent directory of a remote path, or `None` at the root.
#[must_use]
pub fn remote_parent(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some(("", _)) => Some("/"),
        Some((parent, _)) => Some(parent),
        None => None,
    }
}

/// Every directory prefix of `path`, shortest first, for `mkdir -p` walks.
#[must_use]
pub fn remote_prefixes(path: &str) -> Vec<String> {
    let absolute = path.starts_with('/');
    let mut prefixes = Vec::new();
    let mut current = String::new();
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        if absolute || !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}
