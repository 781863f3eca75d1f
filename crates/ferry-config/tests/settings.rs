use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use ferry_config::defaults::{
    ENV_HOST, ENV_KEY, ENV_LOCAL_DIR, ENV_LOGS_DIR, ENV_PATTERN, ENV_PORT, ENV_REMOTE_DIR,
    ENV_SENT_DIR, ENV_USER,
};
use ferry_config::{ConfigError, DotEnv, EnvSource, Settings, SettingsOverrides};

fn env_with_key(key: &str) -> HashMap<String, String> {
    [
        (ENV_HOST, "198.51.100.7"),
        (ENV_PORT, "22"),
        (ENV_USER, "ingest"),
        (ENV_KEY, key),
        (ENV_REMOTE_DIR, "/data/inputs"),
        (ENV_LOCAL_DIR, "files"),
        (ENV_SENT_DIR, "sent"),
        (ENV_LOGS_DIR, "logs"),
        (ENV_PATTERN, "*.csv"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

#[test]
fn cli_overrides_apply_after_environment() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let key = temp.path().join("ingest.pem");
    fs::write(&key, b"key material")?;

    let settings = Settings::from_source(&env_with_key(&key.display().to_string()))?
        .with_overrides(SettingsOverrides {
            local_dir: Some(temp.path().join("inbox")),
            sent_dir: None,
            logs_dir: Some(temp.path().join("audit")),
            pattern: Some("**/*.json".to_string()),
        });
    settings.validate()?;

    assert_eq!(settings.paths.local_dir, temp.path().join("inbox"));
    assert_eq!(settings.paths.sent_dir, PathBuf::from("sent"));
    assert_eq!(settings.paths.logs_dir, temp.path().join("audit"));
    assert_eq!(settings.pattern, "**/*.json");
    Ok(())
}

#[test]
fn blank_pattern_override_fails_validation() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let key = temp.path().join("ingest.pem");
    fs::write(&key, b"key material")?;

    let settings = Settings::from_source(&env_with_key(&key.display().to_string()))?
        .with_overrides(SettingsOverrides {
            pattern: Some(String::new()),
            ..SettingsOverrides::default()
        });
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::InvalidField {
            reason: "empty_pattern",
            ..
        })
    ));
    Ok(())
}

#[test]
fn missing_known_hosts_file_is_rejected() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let key = temp.path().join("ingest.pem");
    fs::write(&key, b"key material")?;

    let mut env = env_with_key(&key.display().to_string());
    env.insert(
        ferry_config::defaults::ENV_KNOWN_HOSTS.to_string(),
        temp.path().join("known_hosts").display().to_string(),
    );
    let settings = Settings::from_source(&env)?;
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::InvalidField {
            reason: "not_a_file",
            ..
        })
    ));
    Ok(())
}

#[test]
fn env_file_fills_gaps_without_overriding() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let key = temp.path().join("ingest.pem");
    fs::write(&key, b"key material")?;
    let env_file = temp.path().join(".env");
    fs::write(
        &env_file,
        "# shared defaults\nFERRY_HOST=files.example.net\nFERRY_PATTERN=\"*.json\"\nFERRY_CONNECT_TIMEOUT_SECS=5\n",
    )?;

    let mut primary = env_with_key(&key.display().to_string());
    primary.remove(ENV_HOST);
    let layered = DotEnv::load(primary, &env_file)?;

    assert_eq!(layered.var(ENV_HOST).as_deref(), Some("files.example.net"));
    let settings = Settings::from_source(&layered)?;
    assert_eq!(settings.remote.host, "files.example.net");
    assert_eq!(settings.pattern, "*.csv");
    assert_eq!(settings.remote.connect_timeout.as_secs(), 5);
    Ok(())
}

#[test]
fn missing_env_file_adds_nothing() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let layered = DotEnv::load(HashMap::new(), &temp.path().join(".env"))?;
    assert!(layered.var(ENV_HOST).is_none());
    Ok(())
}

#[test]
fn malformed_env_file_is_rejected() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let env_file = temp.path().join(".env");
    fs::write(&env_file, "FERRY_HOST files.example.net\n")?;
    assert!(matches!(
        DotEnv::load(HashMap::new(), &env_file),
        Err(ConfigError::EnvFile { .. })
    ));
    Ok(())
}

#[test]
fn logs_dir_equal_to_local_dir_fails_validation() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let key = temp.path().join("ingest.pem");
    fs::write(&key, b"key material")?;
    let inbox = temp.path().join("inbox");
    fs::create_dir_all(&inbox)?;

    let settings = Settings::from_source(&env_with_key(&key.display().to_string()))?
        .with_overrides(SettingsOverrides {
            local_dir: Some(inbox.clone()),
            logs_dir: Some(inbox),
            ..SettingsOverrides::default()
        });
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::InvalidField {
            field: ENV_LOGS_DIR,
            reason: "same_as_local_dir",
            ..
        })
    ));
    Ok(())
}
