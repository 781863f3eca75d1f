//! Rendering of the final run tally.

use anyhow::anyhow;
use ferry_audit::RunSummary;

use crate::cli::{CliError, CliResult, OutputFormat};

pub(crate) fn render_summary(summary: &RunSummary, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(summary)
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}"))),
        OutputFormat::Table => Ok(render_table(summary)),
    }
}

fn render_table(summary: &RunSummary) -> String {
    let counts = &summary.counts;
    let mode = if summary.config.dry_run {
        "dry run"
    } else {
        "upload"
    };
    let rows = [
        ("run", summary.run_id.to_string()),
        ("mode", mode.to_string()),
        ("status", summary.status.as_str().to_string()),
        ("uploaded", counts.uploaded.to_string()),
        ("skipped", counts.skipped.to_string()),
        ("failed", counts.failed.to_string()),
        ("relocation warnings", counts.relocation_warnings.to_string()),
        ("log file", summary.log_file.display().to_string()),
    ];
    rows.iter()
        .map(|(label, value)| format!("{label:<20} {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::{TimeZone, Utc};
    use ferry_audit::{Counts, RunConfigSnapshot, RunStatus};
    use uuid::Uuid;

    fn summary() -> anyhow::Result<RunSummary> {
        let started_at = Utc
            .with_ymd_and_hms(2026, 3, 4, 10, 15, 0)
            .single()
            .ok_or_else(|| anyhow!("valid timestamp"))?;
        Ok(RunSummary {
            run_id: Uuid::nil(),
            started_at,
            finished_at: started_at,
            status: RunStatus::PartialFail,
            counts: Counts {
                total: 4,
                uploaded: 2,
                skipped: 1,
                failed: 1,
                relocation_warnings: 1,
            },
            config: RunConfigSnapshot {
                host: "files.example.net".to_string(),
                port: 22,
                user: "ingest".to_string(),
                remote_dir: "/srv/inputs".to_string(),
                local_dir: PathBuf::from("/data/files"),
                pattern: "*.csv".to_string(),
                recursive: false,
                overwrite: false,
                dry_run: false,
                relocation: "move".to_string(),
                sent_dir: PathBuf::from("/data/sent"),
            },
            log_file: PathBuf::from("/data/logs/upload_20260304_101500.jsonl"),
        })
    }

    #[test]
    fn table_lists_tally_and_log_path() -> anyhow::Result<()> {
        let text = match render_summary(&summary()?, OutputFormat::Table) {
            Ok(text) => text,
            Err(err) => anyhow::bail!("table rendering failed: {}", err.display_message()),
        };
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[2].starts_with("status") && lines[2].ends_with("partial_fail"));
        assert!(lines[3].ends_with(" 2"));
        assert!(lines[4].ends_with(" 1"));
        assert!(lines[5].ends_with(" 1"));
        assert!(lines[6].starts_with("relocation warnings"));
        assert!(lines[7].ends_with("upload_20260304_101500.jsonl"));
        Ok(())
    }

    #[test]
    fn json_is_the_serialized_summary() -> anyhow::Result<()> {
        let summary = summary()?;
        let text = match render_summary(&summary, OutputFormat::Json) {
            Ok(text) => text,
            Err(err) => anyhow::bail!("json rendering failed: {}", err.display_message()),
        };
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["status"], "partial_fail");
        assert_eq!(value["counts"]["uploaded"], 2);
        assert_eq!(value["config"]["pattern"], "*.csv");
        Ok(())
    }
}
