//! Validation helpers and parsing utilities for environment values.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::defaults::{ENV_LOGS_DIR, ENV_SENT_DIR, MAX_CONNECT_TIMEOUT_SECS};
use crate::error::{ConfigError, ConfigResult};
use crate::model::LocalPaths;

/// Parse a TCP port, rejecting zero and anything outside `1..=65535`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value is not a valid port.
pub fn parse_port(value: &str, field: &'static str) -> ConfigResult<u16> {
    let trimmed = value.trim();
    let port = trimmed
        .parse::<u32>()
        .map_err(|_| ConfigError::invalid(field, "not_a_number", trimmed))?;
    if port == 0 {
        return Err(ConfigError::invalid(field, "out_of_range", trimmed));
    }
    u16::try_from(port).map_err(|_| ConfigError::invalid(field, "out_of_range", trimmed))
}

/// Parse a timeout expressed in whole seconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when the value is not a positive
/// integer within the accepted bound.
pub fn parse_timeout_secs(value: &str, field: &'static str) -> ConfigResult<Duration> {
    let trimmed = value.trim();
    let secs = trimmed
        .parse::<u64>()
        .map_err(|_| ConfigError::invalid(field, "not_a_number", trimmed))?;
    if secs == 0 || secs > MAX_CONNECT_TIMEOUT_SECS {
        return Err(ConfigError::invalid(field, "out_of_range", trimmed));
    }
    Ok(Duration::from_secs(secs))
}

/// Reject blank upload patterns; glob syntax is checked when discovery compiles it.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` for an empty pattern.
pub fn validate_pattern(pattern: &str, field: &'static str) -> ConfigResult<()> {
    if pattern.trim().is_empty() {
        return Err(ConfigError::invalid(field, "empty_pattern", pattern));
    }
    Ok(())
}

/// Reject sent or log directories that resolve to the source directory itself.
///
/// Either would make ferry rediscover its own output: relocated files or the
/// audit log being written for the current run.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` with reason `same_as_local_dir`.
pub fn check_distinct_dirs(paths: &LocalPaths) -> ConfigResult<()> {
    let local = resolve_dir(&paths.local_dir);
    for (field, dir) in [(ENV_SENT_DIR, &paths.sent_dir), (ENV_LOGS_DIR, &paths.logs_dir)] {
        if resolve_dir(dir) == local {
            return Err(ConfigError::invalid(
                field,
                "same_as_local_dir",
                dir.display().to_string(),
            ));
        }
    }
    Ok(())
}

fn resolve_dir(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Expand a leading `~` to the current user's home directory.
#[must_use]
pub fn expand_home(raw: &str) -> PathBuf {
    let Some(rest) = raw.strip_prefix('~') else {
        return PathBuf::from(raw);
    };
    if !(rest.is_empty() || rest.starts_with('/')) {
        return PathBuf::from(raw);
    }
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches('/')),
        None => PathBuf::from(raw),
    }
}

/// Confirm the private key exists and warn when it is readable by group or others.
///
/// # Errors
///
/// Returns `ConfigError::KeyNotFound` when the key is missing or not a regular
/// file, and `ConfigError::Io` when its metadata cannot be read.
pub fn check_private_key(path: &Path) -> ConfigResult<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::KeyNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Io {
                operation: "private_key.metadata",
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if !metadata.is_file() {
        return Err(ConfigError::KeyNotFound {
            path: path.to_path_buf(),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            tracing::warn!(
                key = %path.display(),
                mode = format!("{mode:o}"),
                "private key is accessible by other users; consider chmod 600"
            );
        }
    }

    Ok(())
}
