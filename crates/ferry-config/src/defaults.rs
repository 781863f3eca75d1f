//! Environment variable names and default values.
//!
//! # Design
//! - Centralize variable names so the loader, CLI help, and tests agree.

/// Remote SSH host.
pub const ENV_HOST: &str = "FERRY_HOST";
/// Remote SSH port.
pub const ENV_PORT: &str = "FERRY_PORT";
/// Remote SSH user.
pub const ENV_USER: &str = "FERRY_USER";
/// Private key used for public-key authentication.
pub const ENV_KEY: &str = "FERRY_KEY";
/// Optional passphrase protecting the private key.
pub const ENV_KEY_PASSPHRASE: &str = "FERRY_KEY_PASSPHRASE";
/// Optional OpenSSH `known_hosts` file used to verify the host key.
pub const ENV_KNOWN_HOSTS: &str = "FERRY_KNOWN_HOSTS";
/// Optional connect/session timeout in seconds.
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "FERRY_CONNECT_TIMEOUT_SECS";
/// Remote base directory receiving uploads.
pub const ENV_REMOTE_DIR: &str = "FERRY_REMOTE_DIR";
/// Local directory scanned for candidates.
pub const ENV_LOCAL_DIR: &str = "FERRY_LOCAL_DIR";
/// Local directory receiving uploaded files.
pub const ENV_SENT_DIR: &str = "FERRY_SENT_DIR";
/// Local directory receiving audit logs.
pub const ENV_LOGS_DIR: &str = "FERRY_LOGS_DIR";
/// Optional upload glob.
pub const ENV_PATTERN: &str = "FERRY_PATTERN";

/// Optional dotenv file read from the working directory; real environment variables win.
pub const DEFAULT_ENV_FILE: &str = ".env";
/// Pattern used when none is configured; matches every file name.
pub const DEFAULT_PATTERN: &str = "*";
/// Timeout applied to TCP connect and blocking SSH calls.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Upper bound accepted for the connect timeout.
pub(crate) const MAX_CONNECT_TIMEOUT_SECS: u64 = 3_600;
