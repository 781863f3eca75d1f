//! Sequential upload loop: one candidate at a time, one audit line per candidate.
//!
//! # Design
//! - Fatal errors (bad root, unreachable host, base directory, audit IO) abort before or
//!   outside the loop; everything else becomes a failed record and the loop continues.
//! - A connectivity failure discards the session; the next candidate reconnects lazily.
//! - Relocation runs only for real (non-simulated) uploads and never changes the status.

use std::collections::HashSet;
use std::error::Error;

use chrono::{Local, Utc};
use ferry_audit::{
    AuditLog, Counts, RecordTarget, RelocationRecord, RunConfigSnapshot, RunSummary,
    TransferRecord, TransferStatus,
};
use ferry_config::Settings;
use ferry_fsops::{
    Discovery, DiscoveryOptions, Relocation, Relocator, UploadCandidate, sha256_file,
};
use ferry_remote::{Connector, RemoteError, RemoteSession, join_remote, remote_parent};
use ferry_telemetry::RunContextGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::options::RunOptions;

const MISSING_AFTER_COPY: &str = "remote file missing after copy";

/// Drives one upload run against sessions produced by `C`.
#[derive(Debug)]
pub struct UploadOrchestrator<C: Connector> {
    connector: C,
    settings: Settings,
    options: RunOptions,
}

/// Why a candidate failed, before it is turned into a record.
struct CandidateFailure {
    reason: String,
    sha256: Option<String>,
    connectivity: bool,
}

impl CandidateFailure {
    fn new(stage: &str, error: &(dyn Error + 'static), sha256: Option<String>) -> Self {
        Self {
            reason: format!("{stage}: {}", render_chain(error)),
            sha256,
            connectivity: false,
        }
    }

    const fn connectivity(mut self, connectivity: bool) -> Self {
        self.connectivity = connectivity;
        self
    }
}

/// Mutable per-run state threaded through the candidate loop.
struct RunState<S> {
    session: Option<S>,
    ensured_dirs: HashSet<String>,
    counts: Counts,
}

impl<C: Connector> UploadOrchestrator<C> {
    /// Assemble an orchestrator from its collaborators.
    #[must_use]
    pub const fn new(connector: C, settings: Settings, options: RunOptions) -> Self {
        Self {
            connector,
            settings,
            options,
        }
    }

    /// Execute the run and return its summary.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Discovery` for an unusable root or pattern,
    /// `AppError::Remote` when the first session or the base directory
    /// cannot be established, and `AppError::Audit` when the log cannot be
    /// written. Per-candidate failures are recorded, not returned.
    pub fn run(&self) -> AppResult<RunSummary> {
        let started_local = Local::now();
        let run_id = Uuid::new_v4();
        let _run_span = RunContextGuard::enter(&run_id.to_string(), self.options.mode_label());
        let paths = &self.settings.paths;
        let base_dir = self.settings.remote.remote_dir.as_str();

        let discovery = Discovery::new(DiscoveryOptions {
            root: paths.local_dir.clone(),
            pattern: self.settings.pattern.clone(),
            recursive: self.options.recursive,
            excluded: vec![paths.sent_dir.clone(), paths.logs_dir.clone()],
        })
        .map_err(|err| AppError::discovery("discovery.new", err))?;

        info!(
            endpoint = %self.connector.endpoint(),
            local_dir = %discovery.root().display(),
            remote_dir = %base_dir,
            pattern = %self.settings.pattern,
            dry_run = self.options.dry_run,
            "upload run starting"
        );

        let mut session = self
            .connector
            .connect()
            .map_err(|err| AppError::remote("session.connect", err))?;
        let mut ensured_dirs = HashSet::new();
        if !self.options.dry_run {
            session
                .ensure_remote_dir(base_dir)
                .map_err(|err| AppError::remote("session.ensure_base_dir", err))?;
            ensured_dirs.insert(base_dir.to_string());
        }

        // enumerate before the log exists so this run's log is never a candidate
        let candidates = discovery
            .candidates()
            .map_err(|err| AppError::discovery("discovery.candidates", err))?;
        let mut log = AuditLog::create(&paths.logs_dir, started_local)
            .map_err(|err| AppError::audit("audit.create", err))?;
        info!(
            candidates = candidates.len(),
            log_file = %log.path().display(),
            "candidates discovered"
        );

        let relocator = Relocator::new(self.options.relocation.clone());
        let mut state = RunState {
            session: Some(session),
            ensured_dirs,
            counts: Counts::default(),
        };
        for candidate in candidates {
            let record = self.process(&mut state, &relocator, &candidate);
            log_outcome(&record);
            state.counts.record(&record);
            log.record(&record)
                .map_err(|err| AppError::audit("audit.record", err))?;
        }
        drop(state.session.take());

        let summary = RunSummary {
            run_id,
            started_at: started_local.with_timezone(&Utc),
            finished_at: Utc::now(),
            status: state.counts.status(),
            counts: state.counts,
            config: self.snapshot(),
            log_file: log.path().to_path_buf(),
        };
        log.finish(&summary)
            .map_err(|err| AppError::audit("audit.finish", err))?;
        info!(
            status = summary.status.as_str(),
            uploaded = summary.counts.uploaded,
            skipped = summary.counts.skipped,
            failed = summary.counts.failed,
            relocation_warnings = summary.counts.relocation_warnings,
            "upload run finished"
        );
        Ok(summary)
    }

    fn process(
        &self,
        state: &mut RunState<C::Session>,
        relocator: &Relocator,
        candidate: &UploadCandidate,
    ) -> TransferRecord {
        let remote_path = join_remote(&self.settings.remote.remote_dir, &candidate.relative_path);
        let target = RecordTarget {
            local_path: candidate.local_path.clone(),
            relative_path: candidate.relative_path.clone(),
            remote_path,
            size_bytes: candidate.size_bytes,
        };

        match self.transfer(state, candidate, &target) {
            Ok(record) if record.simulated => record,
            Ok(record) if record.status == TransferStatus::Uploaded => {
                relocate(relocator, candidate, record)
            }
            Ok(record) => record,
            Err(failure) => {
                if failure.connectivity && state.session.take().is_some() {
                    warn!(
                        candidate = %candidate.relative_path,
                        "remote session lost; reconnecting before the next candidate"
                    );
                }
                TransferRecord::failed(target, failure.sha256, failure.reason)
            }
        }
    }

    fn transfer(
        &self,
        state: &mut RunState<C::Session>,
        candidate: &UploadCandidate,
        target: &RecordTarget,
    ) -> Result<TransferRecord, CandidateFailure> {
        let remote_path = target.remote_path.as_str();
        let session = active_session(&self.connector, &mut state.session)?;

        if !self.options.overwrite {
            let exists = session.remote_exists(remote_path).map_err(|err| {
                CandidateFailure::new("remote existence check failed", &err, None)
                    .connectivity(err.is_connectivity())
            })?;
            if exists {
                let digest = match sha256_file(&candidate.local_path) {
                    Ok(digest) => Some(digest),
                    Err(err) => {
                        warn!(
                            candidate = %candidate.relative_path,
                            error = %render_chain(&err),
                            "checksum failed for skipped candidate"
                        );
                        None
                    }
                };
                return Ok(TransferRecord::skipped(target.clone(), digest));
            }
        }

        let digest = sha256_file(&candidate.local_path)
            .map_err(|err| CandidateFailure::new("checksum failed", &err, None))?;

        if self.options.dry_run {
            return Ok(TransferRecord::uploaded(target.clone(), digest, true));
        }

        if candidate.relative_parent().is_some()
            && let Some(parent) = remote_parent(remote_path)
            && !state.ensured_dirs.contains(parent)
        {
            session.ensure_remote_dir(parent).map_err(|err| {
                CandidateFailure::new(
                    "remote directory creation failed",
                    &err,
                    Some(digest.clone()),
                )
                .connectivity(err.is_connectivity())
            })?;
            state.ensured_dirs.insert(parent.to_string());
        }

        let bytes = session
            .copy_file(&candidate.local_path, remote_path)
            .map_err(|err| {
                CandidateFailure::new("copy failed", &err, Some(digest.clone()))
                    .connectivity(err.is_connectivity())
            })?;
        debug!(candidate = %candidate.relative_path, bytes, "copy finished");

        let present = session.remote_exists(remote_path).map_err(|err| {
            CandidateFailure::new("verification failed", &err, Some(digest.clone()))
                .connectivity(err.is_connectivity())
        })?;
        if !present {
            return Err(CandidateFailure {
                reason: MISSING_AFTER_COPY.to_string(),
                sha256: Some(digest),
                connectivity: false,
            });
        }
        Ok(TransferRecord::uploaded(target.clone(), digest, false))
    }

    fn snapshot(&self) -> RunConfigSnapshot {
        let remote = &self.settings.remote;
        RunConfigSnapshot {
            host: remote.host.clone(),
            port: remote.port,
            user: remote.user.clone(),
            remote_dir: remote.remote_dir.clone(),
            local_dir: self.settings.paths.local_dir.clone(),
            pattern: self.settings.pattern.clone(),
            recursive: self.options.recursive,
            overwrite: self.options.overwrite,
            dry_run: self.options.dry_run,
            relocation: self.options.relocation.as_str().to_string(),
            sent_dir: self.settings.paths.sent_dir.clone(),
        }
    }
}

/// Return the live session, reconnecting when a previous candidate lost it.
fn active_session<'a, C: Connector>(
    connector: &C,
    slot: &'a mut Option<C::Session>,
) -> Result<&'a mut C::Session, CandidateFailure> {
    if slot.is_none() {
        let session = connector.connect().map_err(|err: RemoteError| {
            CandidateFailure::new("reconnect failed", &err, None).connectivity(true)
        })?;
        info!(endpoint = %connector.endpoint(), "remote session re-established");
        *slot = Some(session);
    }
    slot.as_mut().ok_or_else(|| CandidateFailure {
        reason: "remote session unavailable".to_string(),
        sha256: None,
        connectivity: true,
    })
}

fn relocate(
    relocator: &Relocator,
    candidate: &UploadCandidate,
    record: TransferRecord,
) -> TransferRecord {
    match relocator.relocate(candidate) {
        Ok(relocation) => record.with_relocation(relocation_record(&relocation)),
        Err(err) => {
            let reason = render_chain(&err);
            warn!(
                candidate = %candidate.relative_path,
                error = %reason,
                "relocation failed after upload"
            );
            record.with_relocation_error(reason)
        }
    }
}

fn relocation_record(relocation: &Relocation) -> RelocationRecord {
    RelocationRecord {
        action: relocation.action().to_string(),
        destination: relocation.destination().cloned(),
    }
}

fn log_outcome(record: &TransferRecord) {
    match &record.error {
        Some(error) => warn!(
            candidate = %record.relative_path,
            remote_path = %record.remote_path,
            status = record.status.as_str(),
            error = %error,
            "candidate failed"
        ),
        None => info!(
            candidate = %record.relative_path,
            remote_path = %record.remote_path,
            status = record.status.as_str(),
            simulated = record.simulated,
            "candidate processed"
        ),
    }
}

/// Render an error and its sources as `outer: inner: root`.
fn render_chain(error: &(dyn Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
