//! Handler trait for log output destinations

use super::error::Result;
use super::log_level::LogLevel;
use super::record::LogRecord;
use crate::formatters::Formatter;
use parking_lot::Mutex;
use std::sync::Arc;

/// A formatter shared by every handler that renders with it
pub type SharedFormatter = Arc<dyn Formatter>;

/// A handler behind its own lock, as attached to loggers
pub type SharedHandler = Arc<Mutex<dyn Handler>>;

/// Output destination with a level threshold and a formatter.
///
/// Implementations provide `emit` for already-rendered text; the default
/// `handle` applies the threshold and renders with the attached formatter.
pub trait Handler: Send {
    fn name(&self) -> &str;

    fn level(&self) -> LogLevel;

    fn set_level(&mut self, level: LogLevel);

    fn formatter(&self) -> &SharedFormatter;

    fn set_formatter(&mut self, formatter: SharedFormatter);

    /// Write one rendered record
    fn emit(&mut self, rendered: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Flush and release the destination. Later emits fail.
    fn close(&mut self) -> Result<()>;

    /// Render and write `record` if it passes the threshold.
    ///
    /// Returns whether the record was accepted.
    fn handle(&mut self, record: &mut LogRecord) -> Result<bool> {
        if record.level < self.level() {
            return Ok(false);
        }
        let rendered = self.formatter().format(record);
        self.emit(&rendered)?;
        Ok(true)
    }
}

/// Wrap a handler for attachment to a logger
pub fn shared<H: Handler + 'static>(handler: H) -> SharedHandler {
    Arc::new(Mutex::new(handler))
}

/// Identity comparison of two shared handlers
pub fn same_handler(a: &SharedHandler, b: &SharedHandler) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
