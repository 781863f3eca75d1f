//! Assemble `Settings` from an environment source.
//!
//! # Design
//! - Read every variable through `EnvSource` so tests never mutate the process environment.
//! - Blank values count as missing; all required variables are reported by name.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::defaults::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_PATTERN, ENV_CONNECT_TIMEOUT_SECS, ENV_HOST, ENV_KEY,
    ENV_KEY_PASSPHRASE, ENV_KNOWN_HOSTS, ENV_LOCAL_DIR, ENV_LOGS_DIR, ENV_PATTERN, ENV_PORT,
    ENV_REMOTE_DIR, ENV_SENT_DIR, ENV_USER,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{LocalPaths, Passphrase, RemoteSettings, Settings};
use crate::validate::{
    check_distinct_dirs, check_private_key, expand_home, parse_port, parse_timeout_secs,
    validate_pattern,
};

/// Source of raw configuration values keyed by variable name.
pub trait EnvSource {
    /// Look up a variable; `None` when unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Layers a dotenv file beneath another source; the wrapped source wins.
#[derive(Debug, Clone, Default)]
pub struct DotEnv<S> {
    primary: S,
    file: HashMap<String, String>,
}

impl<S: EnvSource> DotEnv<S> {
    /// Read `path` as a dotenv file beneath `primary`. A missing file yields no extra values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvFile` when the file exists but cannot be read or parsed.
    pub fn load(primary: S, path: &Path) -> ConfigResult<Self> {
        let env_file = |source: dotenvy::Error| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        };
        let file = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries
                .collect::<Result<HashMap<_, _>, _>>()
                .map_err(env_file)?,
            Err(dotenvy::Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                HashMap::new()
            }
            Err(err) => return Err(env_file(err)),
        };
        if !file.is_empty() {
            debug!(path = %path.display(), entries = file.len(), "environment file loaded");
        }
        Ok(Self { primary, file })
    }
}

impl<S: EnvSource> EnvSource for DotEnv<S> {
    fn var(&self, name: &str) -> Option<String> {
        self.primary
            .var(name)
            .or_else(|| self.file.get(name).cloned())
    }
}

impl Settings {
    /// Build settings from an arbitrary source.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a required variable is missing or invalid.
    pub fn from_source(source: &impl EnvSource) -> ConfigResult<Self> {
        let host = required(source, ENV_HOST)?;
        let port = parse_port(&required(source, ENV_PORT)?, ENV_PORT)?;
        let user = required(source, ENV_USER)?;
        let key_path = expand_home(&required(source, ENV_KEY)?);
        let key_passphrase = optional(source, ENV_KEY_PASSPHRASE).map(Passphrase::new);
        let known_hosts = optional(source, ENV_KNOWN_HOSTS).map(|raw| expand_home(&raw));
        let connect_timeout = optional(source, ENV_CONNECT_TIMEOUT_SECS).map_or(
            Ok(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            |raw| parse_timeout_secs(&raw, ENV_CONNECT_TIMEOUT_SECS),
        )?;
        let remote_dir = normalize_remote_dir(&required(source, ENV_REMOTE_DIR)?)?;

        let paths = LocalPaths {
            local_dir: PathBuf::from(required(source, ENV_LOCAL_DIR)?),
            sent_dir: PathBuf::from(required(source, ENV_SENT_DIR)?),
            logs_dir: PathBuf::from(required(source, ENV_LOGS_DIR)?),
        };

        let pattern =
            optional(source, ENV_PATTERN).unwrap_or_else(|| DEFAULT_PATTERN.to_string());
        validate_pattern(&pattern, ENV_PATTERN)?;

        debug!(host = %host, port, user = %user, remote_dir = %remote_dir, "configuration loaded");

        Ok(Self {
            remote: RemoteSettings {
                host,
                port,
                user,
                key_path,
                key_passphrase,
                known_hosts,
                connect_timeout,
                remote_dir,
            },
            paths,
            pattern,
        })
    }

    /// Checks that need the filesystem: key presence, directory layout, and the final pattern.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::KeyNotFound` for a missing key and
    /// `ConfigError::InvalidField` for a blank pattern override or a sent/log
    /// directory that is the source directory.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_pattern(&self.pattern, ENV_PATTERN)?;
        check_distinct_dirs(&self.paths)?;
        check_private_key(&self.remote.key_path)?;
        if let Some(known_hosts) = &self.remote.known_hosts
            && !known_hosts.is_file()
        {
            return Err(ConfigError::invalid(
                ENV_KNOWN_HOSTS,
                "not_a_file",
                known_hosts.display().to_string(),
            ));
        }
        Ok(())
    }
}

fn required(source: &impl EnvSource, name: &'static str) -> ConfigResult<String> {
    optional(source, name).ok_or(ConfigError::MissingEnv { name })
}

fn optional(source: &impl EnvSource, name: &str) -> Option<String> {
    source
        .var(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn normalize_remote_dir(raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        if raw.starts_with('/') {
            return Ok("/".to_string());
        }
        return Err(ConfigError::invalid(ENV_REMOTE_DIR, "empty_path", raw));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn base_env() -> HashMap<String, String> {
        [
            (ENV_HOST, "files.example.net"),
            (ENV_PORT, "4222"),
            (ENV_USER, "ubuntu"),
            (ENV_KEY, "/keys/ingest.pem"),
            (ENV_REMOTE_DIR, "/srv/app/inputs/"),
            (ENV_LOCAL_DIR, "files"),
            (ENV_SENT_DIR, "sent"),
            (ENV_LOGS_DIR, "logs"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }

    #[test]
    fn from_source_reads_required_and_defaults() -> Result<(), Box<dyn Error>> {
        let settings = Settings::from_source(&base_env())?;

        assert_eq!(settings.remote.host, "files.example.net");
        assert_eq!(settings.remote.port, 4222);
        assert_eq!(settings.remote.user, "ubuntu");
        assert_eq!(settings.remote.key_path, PathBuf::from("/keys/ingest.pem"));
        assert_eq!(settings.remote.remote_dir, "/srv/app/inputs");
        assert_eq!(
            settings.remote.connect_timeout,
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
        );
        assert!(settings.remote.key_passphrase.is_none());
        assert!(settings.remote.known_hosts.is_none());
        assert_eq!(settings.paths.local_dir, PathBuf::from("files"));
        assert_eq!(settings.pattern, DEFAULT_PATTERN);
        Ok(())
    }

    #[test]
    fn every_required_variable_is_enforced() {
        for name in [
            ENV_HOST,
            ENV_PORT,
            ENV_USER,
            ENV_KEY,
            ENV_REMOTE_DIR,
            ENV_LOCAL_DIR,
            ENV_SENT_DIR,
            ENV_LOGS_DIR,
        ] {
            let mut env = base_env();
            env.remove(name);
            let result = Settings::from_source(&env);
            assert!(
                matches!(result, Err(ConfigError::MissingEnv { name: missing }) if missing == name),
                "expected {name} to be required"
            );
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut env = base_env();
        env.insert(ENV_USER.to_string(), "   ".to_string());
        assert!(matches!(
            Settings::from_source(&env),
            Err(ConfigError::MissingEnv { name: ENV_USER })
        ));
    }

    #[test]
    fn optional_values_are_parsed() -> Result<(), Box<dyn Error>> {
        let mut env = base_env();
        env.insert(ENV_PATTERN.to_string(), "*.csv".to_string());
        env.insert(ENV_CONNECT_TIMEOUT_SECS.to_string(), "5".to_string());
        env.insert(ENV_KEY_PASSPHRASE.to_string(), "secret".to_string());
        env.insert(ENV_KNOWN_HOSTS.to_string(), "/etc/ssh/known".to_string());

        let settings = Settings::from_source(&env)?;
        assert_eq!(settings.pattern, "*.csv");
        assert_eq!(settings.remote.connect_timeout, Duration::from_secs(5));
        assert_eq!(
            settings
                .remote
                .key_passphrase
                .as_ref()
                .map(Passphrase::expose),
            Some("secret")
        );
        assert_eq!(
            settings.remote.known_hosts,
            Some(PathBuf::from("/etc/ssh/known"))
        );
        Ok(())
    }

    #[test]
    fn invalid_port_is_reported() {
        let mut env = base_env();
        env.insert(ENV_PORT.to_string(), "not-a-port".to_string());
        assert!(matches!(
            Settings::from_source(&env),
            Err(ConfigError::InvalidField {
                field: ENV_PORT,
                ..
            })
        ));
    }

    #[test]
    fn remote_root_is_preserved() -> Result<(), Box<dyn Error>> {
        assert_eq!(normalize_remote_dir("/")?, "/");
        assert_eq!(normalize_remote_dir("inputs//")?, "inputs");
        Ok(())
    }

    #[test]
    fn validate_requires_an_existing_key() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        let mut env = base_env();
        env.insert(
            ENV_KEY.to_string(),
            temp.path().join("missing.pem").display().to_string(),
        );
        let settings = Settings::from_source(&env)?;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::KeyNotFound { .. })
        ));

        let key = temp.path().join("ingest.pem");
        std::fs::write(&key, b"key")?;
        env.insert(ENV_KEY.to_string(), key.display().to_string());
        Settings::from_source(&env)?.validate()?;
        Ok(())
    }
}
