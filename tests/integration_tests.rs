//! Integration tests for pipeline_log_toolkit
//!
//! These tests verify:
//! - File logging sessions (JSON and text, size and time rotation)
//! - Test-capture mode through the registry
//! - Propagation across the logger hierarchy
//! - Timer and metrics reporting
//! - Dataset summaries

use pipeline_log_toolkit::handlers::{CaptureHandler, RotatingFileHandler, RotationPolicy};
use pipeline_log_toolkit::instrument::{DatasetReportOptions, TabularSource};
use pipeline_log_toolkit::prelude::*;
use pipeline_log_toolkit::{info, warning, SharedFormatter};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read log directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_size_rotated_json_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LoggerRegistry::new();

    let config = FileLoggingConfig::new("etl.bronze")
        .with_log_dir(temp_dir.path())
        .with_log_folder("bronze")
        .with_size_rotation(1024 * 1024)
        .with_json_format(true)
        .with_console(false);
    let session = setup_file_logging(&registry, config).expect("Failed to set up logging");

    session.info("ingest started");
    session.warning("late partition");
    session.log_with_context(
        LogLevel::Info,
        "batch written",
        LogContext::new().with_field("request_id", "abc").with_field("rows", 42),
    );
    let log_file = session.log_file().to_path_buf();
    assert!(session.close().is_empty());

    let dir = temp_dir.path().join("bronze");
    let json_files: Vec<String> = files_in(&dir)
        .into_iter()
        .filter(|name| name.ends_with(".json"))
        .collect();
    assert_eq!(json_files.len(), 1);
    assert!(json_files[0].ends_with("-etl_bronze.json"));

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    // "Logger configured" plus three records
    assert_eq!(lines.len(), 4);
    for line in &lines {
        let value: serde_json::Value = serde_json::from_str(line).expect("line is not JSON");
        assert_eq!(value["name"], "etl.bronze");
    }

    let last: serde_json::Value = serde_json::from_str(lines[3]).unwrap();
    assert_eq!(last["request_id"], "abc");
    assert_eq!(last["rows"], 42);
    assert_eq!(last["level"], "INFO");
}

#[test]
fn test_text_session_with_time_rotation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LoggerRegistry::new();

    let config = FileLoggingConfig::new("etl.silver")
        .with_log_dir(temp_dir.path())
        .with_time_rotation(When::Hours, 1)
        .with_timezone("UTC")
        .with_console(false);
    let session = setup_file_logging(&registry, config).expect("Failed to set up logging");

    session.debug("debug reaches the file");
    session.trace("trace does not");
    let log_file = session.log_file().to_path_buf();
    assert!(log_file.extension().is_some_and(|ext| ext == "log"));
    session.close();

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert!(content.contains("[DEBUG] etl.silver - debug reaches the file"));
    assert!(!content.contains("trace does not"));
    assert!(!content.contains('\x1b'));
}

#[test]
fn test_session_close_detaches_handlers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LoggerRegistry::new();

    let session = setup_file_logging(
        &registry,
        FileLoggingConfig::new("etl.gold")
            .with_log_dir(temp_dir.path())
            .with_console(false),
    )
    .expect("Failed to set up logging");
    let logger = session.logger().clone();
    assert_eq!(logger.handlers().len(), 1);

    let failures = session.close();
    assert!(failures.is_empty());
    assert!(!logger.has_handlers());
    assert!(registry.contains("etl.gold"));
}

#[test]
fn test_unknown_timezone_fails_fast() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LoggerRegistry::new();

    let result = setup_file_logging(
        &registry,
        FileLoggingConfig::new("etl")
            .with_log_dir(temp_dir.path())
            .with_timezone("Mars/Olympus_Mons"),
    );
    assert!(matches!(result, Err(LoggerError::UnknownTimezone { .. })));
    assert!(!registry.contains("etl"));
}

#[test]
fn test_session_from_json_document() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let document = format!(
        r#"{{
            "logger_name": "etl.orders",
            "log_dir": {:?},
            "log_folder": "orders",
            "rotation": "size",
            "max_bytes": 4096,
            "backup_count": 2,
            "add_console": false,
            "json_format": true,
            "level": "INFO"
        }}"#,
        temp_dir.path().to_string_lossy()
    );
    let config = FileLoggingConfig::from_json_str(&document).expect("Failed to parse config");
    assert_eq!(config.level, LogLevel::Info);

    let registry = LoggerRegistry::new();
    let session = setup_file_logging(&registry, config).expect("Failed to set up logging");
    session.debug("filtered");
    session.info("kept");
    let log_file = session.log_file().to_path_buf();
    session.close();

    let content = fs::read_to_string(log_file).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(!content.contains("filtered"));
}

#[test]
fn test_capture_mode_reaches_root_handler() {
    let registry = LoggerRegistry::new();
    let capture = CaptureHandler::new(LogLevel::Trace);
    registry.root().add_handler(shared_handler(capture.clone()));

    // production configuration first, then switched to capture
    let own = CaptureHandler::new(LogLevel::Trace);
    registry.get(
        "etl.bronze",
        LoggerOptions::new().with_handler(shared_handler(own.clone())),
    );
    let logger = registry.get(
        "etl.bronze",
        LoggerOptions::test_capture().with_level(LogLevel::Debug),
    );
    assert!(logger.propagate());
    assert!(logger.handlers().is_empty());

    logger.debug("visible to the harness");
    warning!(logger, "{} partitions late", 2);

    assert_eq!(
        capture.messages(),
        vec!["visible to the harness", "2 partitions late"]
    );
    assert!(own.is_empty());
}

#[test]
fn test_propagation_stops_at_non_propagating_logger() {
    let registry = LoggerRegistry::new();
    let root_capture = CaptureHandler::new(LogLevel::Trace);
    let etl_capture = CaptureHandler::new(LogLevel::Trace);
    registry.root().add_handler(shared_handler(root_capture.clone()));

    registry.get(
        "etl",
        LoggerOptions::new()
            .with_level(LogLevel::Info)
            .with_handler(shared_handler(etl_capture.clone())),
    );
    let child = registry.logger("etl.bronze.orders");
    assert_eq!(child.effective_level(), LogLevel::Info);

    child.debug("below inherited level");
    info!(child, "delivered to etl only");

    assert_eq!(etl_capture.messages(), vec!["delivered to etl only"]);
    assert!(root_capture.is_empty());
    assert_eq!(child.metrics().records_emitted(), 1);
}

#[test]
fn test_handler_level_filters_independently() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("errors.log");
    let formatter: SharedFormatter = Arc::new(TextFormatter::default());
    let errors_only = RotatingFileHandler::new(
        &path,
        RotationPolicy::new(),
        LogLevel::Error,
        Arc::clone(&formatter),
    )
    .expect("Failed to create handler");

    let logger = Logger::new("etl.audit");
    let capture = CaptureHandler::new(LogLevel::Trace);
    logger.add_handler(shared_handler(errors_only));
    logger.add_handler(shared_handler(capture.clone()));

    logger.info("routine");
    logger.error("broken");
    logger.flush().expect("Failed to flush");

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("broken"));
    assert_eq!(capture.len(), 2);
}

#[derive(Debug)]
struct ValueError(String);

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValueError {}

#[test]
fn test_timer_failure_scenario() {
    let registry = LoggerRegistry::new();
    let capture = CaptureHandler::new(LogLevel::Trace);
    registry.root().add_handler(shared_handler(capture.clone()));
    let logger = registry.get("etl.load", LoggerOptions::test_capture().with_level(LogLevel::Info));

    let guard = LogTimer::new(&logger, "load").enter();
    let outcome: std::result::Result<u32, ValueError> = Err(ValueError("bad".to_string()));
    let returned = guard.exit(outcome);

    assert_eq!(returned.unwrap_err().to_string(), "bad");
    let errors: Vec<String> = capture
        .records()
        .iter()
        .filter(|r| r.level == LogLevel::Error)
        .map(|r| r.message())
        .collect();
    assert_eq!(errors.len(), 1);
    let message = &errors[0];
    assert!(message.contains("load"));
    assert!(message.contains("ValueError"));
    assert!(message.contains("bad"));

    let elapsed: f64 = message
        .split("after ")
        .nth(1)
        .and_then(|rest| rest.split(' ').next())
        .and_then(|value| value.parse().ok())
        .expect("elapsed seconds missing");
    assert!(elapsed >= 0.0);
}

#[test]
fn test_metrics_report_through_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LoggerRegistry::new();
    let session = setup_file_logging(
        &registry,
        FileLoggingConfig::new("etl.metrics")
            .with_log_dir(temp_dir.path())
            .with_console(false),
    )
    .expect("Failed to set up logging");

    let mut metrics = LogMetrics::new(&session);
    metrics.increment("x");
    metrics.increment_by("x", 3);
    assert_eq!(metrics.counter("x"), Some(4));
    assert_eq!(metrics.stop("never_started"), 0.0);
    metrics.start("total");
    metrics.stop("total");
    metrics.log_all();

    let log_file = session.log_file().to_path_buf();
    session.close();

    let content = fs::read_to_string(log_file).unwrap();
    assert_eq!(content.matches("  - x: 4").count(), 1);
    assert!(content.contains("Counters:"));
    assert!(content.contains("Completed timers:"));
    assert!(!content.contains("never_started"));
}

struct StaticTable;

impl TabularSource for StaticTable {
    type Error = String;

    fn row_count(&self) -> std::result::Result<u64, String> {
        Ok(3)
    }

    fn schema_description(&self) -> std::result::Result<String, String> {
        Ok("id: long".to_string())
    }

    fn sample(&self, _rows: usize) -> std::result::Result<String, String> {
        Err("sampling disabled".to_string())
    }

    fn column_statistics(&self) -> std::result::Result<Option<String>, String> {
        Ok(Some("id mean=2".to_string()))
    }
}

#[test]
fn test_dataset_report() {
    let logger = Logger::new("etl.report");
    let capture = CaptureHandler::new(LogLevel::Trace);
    logger.add_handler(shared_handler(capture.clone()));

    log_dataset_info(
        Some(&StaticTable),
        &logger,
        &DatasetReportOptions::new("Silver").with_sample(10),
    );

    let records = capture.records();
    assert_eq!(records.len(), 4);
    assert_eq!(records[2].level, LogLevel::Error);
    assert_eq!(records[2].message(), "[Silver] Error showing sample: sampling disabled");
    assert_eq!(records[3].message(), "[Silver] Statistics:\nid mean=2");
}

#[test]
fn test_exception_in_json_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LoggerRegistry::new();
    let session = setup_file_logging(
        &registry,
        FileLoggingConfig::new("etl.errors")
            .with_log_dir(temp_dir.path())
            .with_json_format(true)
            .with_console(false),
    )
    .expect("Failed to set up logging");

    session.exception("write failed", &ValueError("disk full".to_string()));
    let log_file = session.log_file().to_path_buf();
    session.close();

    let content = fs::read_to_string(log_file).unwrap();
    let last: serde_json::Value =
        serde_json::from_str(content.lines().last().unwrap()).expect("line is not JSON");
    assert_eq!(last["level"], "ERROR");
    assert_eq!(last["exception"]["type"], "ValueError");
    assert_eq!(last["exception"]["message"], "disk full");
}
