//! Writer and reader working against real files.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, TimeZone, Utc};
use ferry_audit::{
    AuditError, AuditLog, Counts, RecordTarget, RunConfigSnapshot, RunStatus, RunSummary,
    TransferRecord, TransferStatus, read_log,
};
use uuid::Uuid;

fn target(name: &str) -> RecordTarget {
    RecordTarget {
        local_path: PathBuf::from("/data/files").join(name),
        relative_path: name.to_string(),
        remote_path: format!("/srv/in/{name}"),
        size_bytes: 3,
    }
}

fn summary(log_file: PathBuf, counts: Counts) -> RunSummary {
    RunSummary {
        run_id: Uuid::new_v4(),
        started_at: Utc::now(),
        finished_at: Utc::now(),
        status: counts.status(),
        counts,
        config: RunConfigSnapshot {
            host: "files.example.net".to_string(),
            port: 22,
            user: "ingest".to_string(),
            remote_dir: "/srv/in".to_string(),
            local_dir: PathBuf::from("/data/files"),
            pattern: "*.csv".to_string(),
            recursive: false,
            overwrite: false,
            dry_run: false,
            relocation: "move".to_string(),
            sent_dir: PathBuf::from("/data/sent"),
        },
        log_file,
    }
}

#[test]
fn log_name_follows_start_time_and_never_overwrites() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let logs = temp.path().join("logs");
    let started = Local
        .with_ymd_and_hms(2024, 7, 1, 8, 30, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous local time"))?;

    let first = AuditLog::create(&logs, started)?;
    let second = AuditLog::create(&logs, started)?;
    assert_eq!(first.path(), logs.join("upload_20240701_083000.jsonl"));
    assert_eq!(second.path(), logs.join("upload_20240701_083000_1.jsonl"));
    Ok(())
}

#[test]
fn records_are_flushed_as_they_are_written() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let mut log = AuditLog::create(temp.path(), Local::now())?;
    log.record(&TransferRecord::uploaded(target("a.csv"), "aa".to_string(), false))?;

    let contents = fs::read_to_string(log.path())?;
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.ends_with('\n'));

    let partial = read_log(log.path())?;
    assert!(!partial.is_complete());
    assert_eq!(partial.records.len(), 1);
    assert_eq!(log.records(), 1);
    Ok(())
}

#[test]
fn complete_log_round_trips_through_the_reader() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let mut log = AuditLog::create(temp.path(), Local::now())?;
    let records = vec![
        TransferRecord::uploaded(target("a.csv"), "aa".to_string(), false),
        TransferRecord::skipped(target("b.csv"), Some("bb".to_string())),
        TransferRecord::failed(target("c.csv"), None, "remote file missing after copy"),
    ];
    let mut counts = Counts::default();
    for record in &records {
        log.record(record)?;
        counts.record(record);
    }
    let path = log.path().to_path_buf();
    let written = log.finish(&summary(path.clone(), counts))?;
    assert_eq!(written, path);

    let report = read_log(&path)?;
    assert!(report.is_complete());
    assert_eq!(report.records, records);
    assert_eq!(report.counts(), counts);
    let summary = report
        .summary
        .ok_or_else(|| anyhow::anyhow!("summary missing"))?;
    assert_eq!(summary.status, RunStatus::PartialFail);
    assert_eq!(summary.log_file, path);
    assert_eq!(report.records[2].status, TransferStatus::Failed);
    Ok(())
}

#[test]
fn summary_line_uses_run_end_event() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let log = AuditLog::create(temp.path(), Local::now())?;
    let path = log.path().to_path_buf();
    log.finish(&summary(path.clone(), Counts::default()))?;

    let contents = fs::read_to_string(&path)?;
    let value: serde_json::Value = serde_json::from_str(contents.trim())?;
    assert_eq!(value["event"], "run_end");
    assert_eq!(value["status"], "no_files");
    assert_eq!(value["counts"]["total"], 0);
    assert_eq!(value["config"]["relocation"], "move");
    Ok(())
}

#[test]
fn reader_rejects_garbage_and_trailing_records() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let garbage = temp.path().join("garbage.jsonl");
    fs::write(&garbage, "{\"event\":\"file\"}\nnot json\n")?;
    assert!(matches!(
        read_log(&garbage),
        Err(AuditError::Decode { line: 1, .. })
    ));

    let log = AuditLog::create(temp.path(), Local::now())?;
    let path = log.path().to_path_buf();
    log.finish(&summary(path.clone(), Counts::default()))?;
    let line = serde_json::to_string(&ferry_audit::LogRecord::File(TransferRecord::skipped(
        target("late.csv"),
        None,
    )))?;
    let mut contents = fs::read_to_string(&path)?;
    contents.push_str(&line);
    contents.push('\n');
    fs::write(&path, contents)?;
    assert!(matches!(
        read_log(&path),
        Err(AuditError::Malformed {
            reason: "record_after_summary",
            ..
        })
    ));
    Ok(())
}
