//! Typed settings assembled once at startup.
//!
//! # Design
//! - Pure data carriers; parsing lives in `loader.rs`/`validate.rs`.
//! - Settings are immutable after construction and passed explicitly to every component.

use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for one upload run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// SSH connection and remote destination.
    pub remote: RemoteSettings,
    /// Local source, sent, and log directories.
    pub paths: LocalPaths,
    /// Glob used to select upload candidates.
    pub pattern: String,
}

impl Settings {
    /// Apply command-line overrides on top of the environment-derived settings.
    #[must_use]
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(local_dir) = overrides.local_dir {
            self.paths.local_dir = local_dir;
        }
        if let Some(sent_dir) = overrides.sent_dir {
            self.paths.sent_dir = sent_dir;
        }
        if let Some(logs_dir) = overrides.logs_dir {
            self.paths.logs_dir = logs_dir;
        }
        if let Some(pattern) = overrides.pattern {
            self.pattern = pattern;
        }
        self
    }
}

/// SSH endpoint, credentials, and remote base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Remote host name or address.
    pub host: String,
    /// Remote SSH port.
    pub port: u16,
    /// Remote login user.
    pub user: String,
    /// Private key path (home directory already expanded).
    pub key_path: PathBuf,
    /// Optional passphrase for the private key.
    pub key_passphrase: Option<Passphrase>,
    /// Optional `known_hosts` file; host keys are verified when present.
    pub known_hosts: Option<PathBuf>,
    /// Timeout for TCP connect and blocking SSH calls.
    pub connect_timeout: Duration,
    /// Remote base directory that receives uploads.
    pub remote_dir: String,
}

impl RemoteSettings {
    /// `user@host:port` label used in logs and error messages.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Local directories used by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPaths {
    /// Directory scanned for candidates.
    pub local_dir: PathBuf,
    /// Directory receiving uploaded files when relocation moves them.
    pub sent_dir: PathBuf,
    /// Directory receiving per-run audit logs.
    pub logs_dir: PathBuf,
}

/// Secret key passphrase; never rendered by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(String);

impl Passphrase {
    /// Wrap a passphrase value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Expose the passphrase for the authentication call.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Passphrase {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("Passphrase(***)")
    }
}

/// Optional values supplied on the command line that win over the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    /// Replacement source directory.
    pub local_dir: Option<PathBuf>,
    /// Replacement sent directory.
    pub sent_dir: Option<PathBuf>,
    /// Replacement log directory.
    pub logs_dir: Option<PathBuf>,
    /// Replacement upload glob.
    pub pattern: Option<String>,
}
