//! In-memory handler for asserting on emitted records

use crate::core::{Handler, LogLevel, LogRecord, Result, SharedFormatter};
use crate::formatters::TextFormatter;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Captured {
    records: Vec<LogRecord>,
    lines: Vec<String>,
}

/// Keeps every accepted record and its rendered text.
///
/// Clones share the same buffer, so a test can keep one clone while another is
/// attached to a logger.
///
/// # Examples
///
/// ```
/// use pipeline_log_toolkit::handlers::CaptureHandler;
/// use pipeline_log_toolkit::{shared_handler, LogLevel, LoggerOptions, LoggerRegistry};
///
/// let registry = LoggerRegistry::new();
/// let capture = CaptureHandler::new(LogLevel::Debug);
/// registry.root().add_handler(shared_handler(capture.clone()));
///
/// let logger = registry.get("etl.silver", LoggerOptions::test_capture());
/// logger.warning("late partition");
///
/// assert_eq!(capture.messages(), vec!["late partition"]);
/// ```
#[derive(Clone)]
pub struct CaptureHandler {
    level: LogLevel,
    formatter: SharedFormatter,
    captured: Arc<Mutex<Captured>>,
}

impl CaptureHandler {
    pub fn new(level: LogLevel) -> Self {
        Self::with_formatter(level, Arc::new(TextFormatter::default()))
    }

    pub fn with_formatter(level: LogLevel, formatter: SharedFormatter) -> Self {
        Self {
            level,
            formatter,
            captured: Arc::new(Mutex::new(Captured::default())),
        }
    }

    /// Snapshot of captured records
    pub fn records(&self) -> Vec<LogRecord> {
        self.captured.lock().records.clone()
    }

    /// Interpolated messages of captured records
    pub fn messages(&self) -> Vec<String> {
        self.captured
            .lock()
            .records
            .iter()
            .map(LogRecord::message)
            .collect()
    }

    /// Rendered output lines
    pub fn lines(&self) -> Vec<String> {
        self.captured.lock().lines.clone()
    }

    pub fn len(&self) -> usize {
        self.captured.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut captured = self.captured.lock();
        captured.records.clear();
        captured.lines.clear();
    }
}

impl Handler for CaptureHandler {
    fn name(&self) -> &str {
        "capture"
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    fn formatter(&self) -> &SharedFormatter {
        &self.formatter
    }

    fn set_formatter(&mut self, formatter: SharedFormatter) {
        self.formatter = formatter;
    }

    fn emit(&mut self, rendered: &str) -> Result<()> {
        self.captured.lock().lines.push(rendered.to_string());
        Ok(())
    }

    fn handle(&mut self, record: &mut LogRecord) -> Result<bool> {
        if record.level < self.level {
            return Ok(false);
        }
        let rendered = self.formatter.format(record);
        self.captured.lock().records.push(record.clone());
        self.emit(&rendered)?;
        Ok(true)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_above_threshold() {
        let mut capture = CaptureHandler::new(LogLevel::Warning);
        let view = capture.clone();

        let mut info = LogRecord::new("etl", LogLevel::Info, "skipped");
        let mut error = LogRecord::new("etl", LogLevel::Error, "rows {}").with_args(vec![3.into()]);
        capture.handle(&mut info).unwrap();
        capture.handle(&mut error).unwrap();

        assert_eq!(view.len(), 1);
        assert_eq!(view.messages(), vec!["rows 3"]);
        assert!(view.lines()[0].contains("[ERROR] etl - rows 3"));

        view.clear();
        assert!(capture.is_empty());
    }
}
