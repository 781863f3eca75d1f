//! Argument parsing, error mapping, and the top-level run entry point.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ferry_app::{AppError, RunOptions, relocation_mode};
use ferry_audit::RunSummary;
use ferry_config::defaults::DEFAULT_ENV_FILE;
use ferry_config::{ConfigError, DotEnv, EnvSource, ProcessEnv, Settings, SettingsOverrides};
use ferry_telemetry::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, TelemetryError, build_version, init_logging,
};
use tracing::debug;

use crate::output::render_summary;

/// Entry point for the ferry binary; returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_version: env!("CARGO_PKG_VERSION"),
    };
    if let Err(err) = init_logging(&logging) {
        let err = CliError::failure(anyhow::Error::new(err).context("failed to initialise logging"));
        eprintln!("error: {}", err.display_message());
        return err.exit_code();
    }
    debug!(version = build_version(), "logging initialised");

    let result = match DotEnv::load(ProcessEnv, &cli.env_file) {
        Ok(env) => execute(&cli, &env)
            .await
            .and_then(|summary| render_summary(&summary, cli.output)),
        Err(err) => Err(config_error(err)),
    };

    match result {
        Ok(rendered) => {
            println!("{rendered}");
            0
        }
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

/// Load settings, apply flag overrides, and run the upload.
async fn execute(cli: &Cli, env: &(impl EnvSource + Sync)) -> CliResult<RunSummary> {
    let settings = Settings::from_source(env)
        .map_err(config_error)?
        .with_overrides(cli.overrides());
    let options = cli.run_options(&settings);
    ferry_app::run_upload(settings, options)
        .await
        .map_err(app_error)
}

fn config_error(err: ConfigError) -> CliError {
    CliError::validation(format!(
        "{:#}",
        anyhow::Error::new(err).context("invalid configuration")
    ))
}

fn app_error(err: AppError) -> CliError {
    if err.is_configuration() {
        CliError::validation(format!("{:#}", anyhow::Error::new(err)))
    } else {
        CliError::failure(err)
    }
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug)]
#[command(
    name = "ferry",
    version,
    about = "Upload local files to a remote directory over SSH and keep an audit log"
)]
struct Cli {
    /// Descend into subdirectories of the local directory.
    #[arg(long, short = 'r')]
    recursive: bool,
    /// Glob selecting files to upload (overrides `FERRY_PATTERN`).
    #[arg(long)]
    pattern: Option<String>,
    /// Log what would be uploaded without copying or relocating anything.
    #[arg(long)]
    dry_run: bool,
    /// Replace files that already exist on the remote host.
    #[arg(long)]
    overwrite: bool,
    /// Source directory (overrides `FERRY_LOCAL_DIR`).
    #[arg(long)]
    local_dir: Option<PathBuf>,
    /// Directory receiving uploaded files (overrides `FERRY_SENT_DIR`).
    #[arg(long)]
    sent_dir: Option<PathBuf>,
    /// Directory receiving audit logs (overrides `FERRY_LOGS_DIR`).
    #[arg(long)]
    logs_dir: Option<PathBuf>,
    /// Leave uploaded files where they are.
    #[arg(long)]
    keep_local: bool,
    /// Delete uploaded files instead of moving them.
    #[arg(long)]
    delete_after: bool,
    /// Format of the final tally.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Operational log format (`pretty` or `json`); defaults to pretty in debug builds.
    #[arg(long, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
    /// Dotenv file supplying `FERRY_*` variables missing from the environment.
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            local_dir: self.local_dir.clone(),
            sent_dir: self.sent_dir.clone(),
            logs_dir: self.logs_dir.clone(),
            pattern: self.pattern.clone(),
        }
    }

    fn run_options(&self, settings: &Settings) -> RunOptions {
        RunOptions {
            recursive: self.recursive,
            dry_run: self.dry_run,
            overwrite: self.overwrite,
            relocation: relocation_mode(
                self.keep_local,
                self.delete_after,
                &settings.paths.sent_dir,
            ),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_log_format(raw: &str) -> Result<LogFormat, String> {
    raw.parse()
        .map_err(|err: TelemetryError| format!("{err}: {raw}"))
}

#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::TcpListener;

    use ferry_fsops::RelocationMode;
    use ferry_test_support::Sandbox;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["ferry"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => panic!("arguments should parse: {err}"),
        }
    }

    fn closed_port() -> anyhow::Result<u16> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);
        Ok(port)
    }

    fn local_env(sandbox: &Sandbox) -> anyhow::Result<HashMap<String, String>> {
        let mut env = sandbox.env();
        env.insert("FERRY_HOST".to_string(), "127.0.0.1".to_string());
        env.insert("FERRY_PORT".to_string(), closed_port()?.to_string());
        env.insert("FERRY_CONNECT_TIMEOUT_SECS".to_string(), "2".to_string());
        Ok(env)
    }

    #[test]
    fn defaults_parse_without_flags() {
        let cli = parse(&[]);
        assert!(!cli.recursive);
        assert!(!cli.dry_run);
        assert!(!cli.overwrite);
        assert_eq!(cli.output, OutputFormat::Table);
        assert_eq!(cli.log_level, DEFAULT_LOG_LEVEL);
        assert!(cli.log_format.is_none());
        assert!(cli.pattern.is_none());
        assert_eq!(cli.env_file, PathBuf::from(DEFAULT_ENV_FILE));
    }

    #[test]
    fn flags_map_onto_overrides_and_options() -> anyhow::Result<()> {
        let sandbox = Sandbox::new()?;
        let cli = parse(&[
            "--recursive",
            "--dry-run",
            "--overwrite",
            "--pattern",
            "*.csv",
            "--local-dir",
            "/data/inbox",
            "--output",
            "json",
            "--log-format",
            "json",
        ]);
        let settings = sandbox.settings("*").with_overrides(cli.overrides());
        assert_eq!(settings.pattern, "*.csv");
        assert_eq!(settings.paths.local_dir, PathBuf::from("/data/inbox"));
        assert_eq!(settings.paths.sent_dir, sandbox.sent_dir());

        let options = cli.run_options(&settings);
        assert!(options.recursive && options.dry_run && options.overwrite);
        assert_eq!(
            options.relocation,
            RelocationMode::Move {
                sent_dir: sandbox.sent_dir()
            }
        );
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        Ok(())
    }

    #[test]
    fn delete_after_wins_over_keep_local() -> anyhow::Result<()> {
        let sandbox = Sandbox::new()?;
        let settings = sandbox.settings("*");
        let both = parse(&["--keep-local", "--delete-after"]);
        assert_eq!(both.run_options(&settings).relocation, RelocationMode::Delete);
        let keep = parse(&["--keep-local"]);
        assert_eq!(keep.run_options(&settings).relocation, RelocationMode::Keep);
        Ok(())
    }

    #[test]
    fn unknown_formats_are_rejected() {
        assert!(Cli::try_parse_from(["ferry", "--output", "yaml"]).is_err());
        assert!(Cli::try_parse_from(["ferry", "--log-format", "xml"]).is_err());
        assert_eq!(parse(&["--log-format", "text"]).log_format, Some(LogFormat::Pretty));
    }

    #[test]
    fn cli_error_exit_codes_and_messages() {
        let validation = CliError::validation("missing FERRY_HOST");
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "missing FERRY_HOST");

        let failure = CliError::failure(anyhow::anyhow!("refused").context("connect failed"));
        assert_eq!(failure.exit_code(), 3);
        assert_eq!(failure.display_message(), "connect failed: refused");
    }

    #[tokio::test]
    async fn missing_environment_is_a_validation_error() -> anyhow::Result<()> {
        let sandbox = Sandbox::new()?;
        let mut env = sandbox.env();
        env.remove("FERRY_HOST");

        let err = match execute(&parse(&[]), &env).await {
            Ok(_) => anyhow::bail!("run should not start without a host"),
            Err(err) => err,
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("FERRY_HOST"));
        Ok(())
    }

    #[tokio::test]
    async fn env_file_supplies_missing_variables() -> anyhow::Result<()> {
        let sandbox = Sandbox::new()?;
        let mut env = local_env(&sandbox)?;
        let host = env
            .remove("FERRY_HOST")
            .ok_or_else(|| anyhow::anyhow!("host should be set"))?;
        let env_file = sandbox.root().join("ferry.env");
        std::fs::write(&env_file, format!("FERRY_HOST={host}\n"))?;

        let cli = parse(&["--env-file", &env_file.display().to_string()]);
        let layered = DotEnv::load(env, &cli.env_file)?;
        let err = match execute(&cli, &layered).await {
            Ok(_) => anyhow::bail!("run should abort when the host refuses connections"),
            Err(err) => err,
        };
        // got past configuration and failed at connect
        assert_eq!(err.exit_code(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn log_dir_inside_the_source_dir_is_a_validation_error() -> anyhow::Result<()> {
        let sandbox = Sandbox::new()?;
        sandbox.write("a.csv", b"id\n")?;
        let env = local_env(&sandbox)?;
        let local = sandbox.local_dir().display().to_string();

        let err = match execute(&parse(&["--logs-dir", &local]), &env).await {
            Ok(_) => anyhow::bail!("run should not start with logs in the source directory"),
            Err(err) => err,
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("configuration"));
        assert_eq!(Sandbox::list(&sandbox.local_dir())?, vec!["a.csv"]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_key_is_a_validation_error() -> anyhow::Result<()> {
        let sandbox = Sandbox::new()?;
        let mut env = local_env(&sandbox)?;
        env.insert(
            "FERRY_KEY".to_string(),
            sandbox.root().join("absent").display().to_string(),
        );

        let err = match execute(&parse(&[]), &env).await {
            Ok(_) => anyhow::bail!("run should not start without a key"),
            Err(err) => err,
        };
        assert_eq!(err.exit_code(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn missing_local_dir_is_a_validation_error() -> anyhow::Result<()> {
        let sandbox = Sandbox::new()?;
        let env = local_env(&sandbox)?;
        let missing = sandbox.root().join("nowhere").display().to_string();

        let err = match execute(&parse(&["--local-dir", &missing]), &env).await {
            Ok(_) => anyhow::bail!("run should not start without a source directory"),
            Err(err) => err,
        };
        assert_eq!(err.exit_code(), 2);
        assert!(Sandbox::list(&sandbox.logs_dir())?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_host_is_a_failure_without_log() -> anyhow::Result<()> {
        let sandbox = Sandbox::new()?;
        sandbox.write("a.csv", b"id\n1\n")?;
        let env = local_env(&sandbox)?;

        let err = match execute(&parse(&[]), &env).await {
            Ok(_) => anyhow::bail!("run should abort when the host refuses connections"),
            Err(err) => err,
        };
        assert_eq!(err.exit_code(), 3);
        assert!(Sandbox::list(&sandbox.logs_dir())?.is_empty());
        assert_eq!(Sandbox::list(&sandbox.local_dir())?, vec!["a.csv"]);
        Ok(())
    }
}
