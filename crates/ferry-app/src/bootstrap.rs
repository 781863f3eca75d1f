//! Entry points that wire settings, the SSH connector, and the orchestrator together.

use ferry_audit::RunSummary;
use ferry_config::Settings;
use ferry_remote::{Connector, SshConnector};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::options::RunOptions;
use crate::orchestrator::UploadOrchestrator;

/// Validate settings and run one upload against the configured SSH host.
///
/// # Errors
///
/// Returns `AppError::Config` when settings fail validation and any fatal
/// error raised by [`run_with`].
pub async fn run_upload(settings: Settings, options: RunOptions) -> AppResult<RunSummary> {
    settings
        .validate()
        .map_err(|err| AppError::config("settings.validate", err))?;
    let connector = SshConnector::new(settings.remote.clone());
    run_with(connector, settings, options).await
}

/// Run the blocking pipeline on the blocking thread pool with an injected connector.
///
/// # Errors
///
/// Returns the orchestrator's fatal errors, or `AppError::Join` when the
/// blocking task panics.
pub async fn run_with<C>(
    connector: C,
    settings: Settings,
    options: RunOptions,
) -> AppResult<RunSummary>
where
    C: Connector + Send + 'static,
{
    debug!(endpoint = %connector.endpoint(), "dispatching upload pipeline");
    tokio::task::spawn_blocking(move || UploadOrchestrator::new(connector, settings, options).run())
        .await
        .map_err(|source| AppError::Join {
            operation: "pipeline.join",
            source,
        })?
}
