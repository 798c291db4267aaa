//! Named loggers
//!
//! A [`Logger`] is a cheap, clonable handle. Loggers form a dot-separated
//! hierarchy maintained by [`crate::LoggerRegistry`]: a record is delivered
//! to the handlers of its logger and, while `propagate` is set, to those of
//! every ancestor.

use super::{
    error::Result,
    handler::{same_handler, SharedHandler},
    log_context::LogContext,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    record::{ExceptionInfo, LogRecord},
};
use parking_lot::RwLock;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Name of the hierarchy root
pub const ROOT_LOGGER_NAME: &str = "root";

/// Level the root logger starts with
pub const DEFAULT_ROOT_LEVEL: LogLevel = LogLevel::Warning;

/// How a registry last configured a logger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggerMode {
    /// Owns its handler set; propagation usually off
    #[default]
    Production,
    /// No handlers of its own; always propagates to ancestors
    TestCapture,
}

struct LoggerInner {
    name: String,
    /// `None` defers to the nearest ancestor with a level
    level: RwLock<Option<LogLevel>>,
    handlers: RwLock<Vec<SharedHandler>>,
    propagate: AtomicBool,
    parent: RwLock<Option<Logger>>,
    mode: RwLock<LoggerMode>,
    metrics: LoggerMetrics,
}

/// Handle to a named logger
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// A detached logger with no parent and no level of its own.
    ///
    /// Loggers obtained from a [`crate::LoggerRegistry`] are wired into its
    /// hierarchy; a detached logger only reaches its own handlers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.into(),
                level: RwLock::new(None),
                handlers: RwLock::new(Vec::new()),
                propagate: AtomicBool::new(true),
                parent: RwLock::new(None),
                mode: RwLock::new(LoggerMode::Production),
                metrics: LoggerMetrics::new(),
            }),
        }
    }

    pub(crate) fn root() -> Self {
        let root = Self::new(ROOT_LOGGER_NAME);
        root.set_level(DEFAULT_ROOT_LEVEL);
        root
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Level set on this logger, if any
    pub fn level(&self) -> Option<LogLevel> {
        *self.inner.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.inner.level.write() = Some(level);
    }

    /// Defer to the ancestors' level again
    pub fn clear_level(&self) {
        *self.inner.level.write() = None;
    }

    /// First level set on this logger or an ancestor.
    ///
    /// A detached logger without a level admits everything.
    pub fn effective_level(&self) -> LogLevel {
        let mut current = Some(self.clone());
        while let Some(logger) = current {
            if let Some(level) = logger.level() {
                return level;
            }
            current = logger.parent();
        }
        LogLevel::Trace
    }

    #[inline]
    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        level >= self.effective_level()
    }

    pub fn propagate(&self) -> bool {
        self.inner.propagate.load(Ordering::Relaxed)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.inner.propagate.store(propagate, Ordering::Relaxed);
    }

    pub fn mode(&self) -> LoggerMode {
        *self.inner.mode.read()
    }

    pub(crate) fn set_mode(&self, mode: LoggerMode) {
        *self.inner.mode.write() = mode;
    }

    pub fn parent(&self) -> Option<Logger> {
        self.inner.parent.read().clone()
    }

    pub(crate) fn set_parent(&self, parent: Option<Logger>) {
        *self.inner.parent.write() = parent;
    }

    /// Snapshot of the attached handlers
    pub fn handlers(&self) -> Vec<SharedHandler> {
        self.inner.handlers.read().clone()
    }

    pub fn has_handlers(&self) -> bool {
        !self.inner.handlers.read().is_empty()
    }

    /// Attach a handler unless this exact handler is already attached
    pub fn add_handler(&self, handler: SharedHandler) {
        let mut handlers = self.inner.handlers.write();
        if !handlers.iter().any(|h| same_handler(h, &handler)) {
            handlers.push(handler);
        }
    }

    /// Detach a handler; returns whether it was attached
    pub fn remove_handler(&self, handler: &SharedHandler) -> bool {
        let mut handlers = self.inner.handlers.write();
        let before = handlers.len();
        handlers.retain(|h| !same_handler(h, handler));
        handlers.len() != before
    }

    /// Detach every handler and hand them back
    pub fn clear_handlers(&self) -> Vec<SharedHandler> {
        std::mem::take(&mut *self.inner.handlers.write())
    }

    /// Replace the handler set
    pub fn set_handlers(&self, handlers: Vec<SharedHandler>) {
        let mut current = self.inner.handlers.write();
        current.clear();
        for handler in handlers {
            if !current.iter().any(|h| same_handler(h, &handler)) {
                current.push(handler);
            }
        }
    }

    /// Health counters for this logger
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.inner.metrics
    }

    /// Flush this logger's own handlers; the first failure is returned after
    /// all of them were tried.
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for handler in self.handlers() {
            if let Err(e) = handler.lock().flush() {
                self.inner.metrics.record_handler_error();
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_enabled_for(level) {
            return;
        }
        let record = self.make_record(level, message.into(), Location::caller());
        self.handle(record);
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(LogLevel::Critical, message);
    }

    /// Log with structured extra fields
    #[track_caller]
    pub fn log_with_context(&self, level: LogLevel, message: impl Into<String>, context: LogContext) {
        if !self.is_enabled_for(level) {
            return;
        }
        let record = self
            .make_record(level, message.into(), Location::caller())
            .with_extra(context);
        self.handle(record);
    }

    #[track_caller]
    pub fn info_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Info, message, context);
    }

    #[track_caller]
    pub fn error_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Error, message, context);
    }

    /// Log at ERROR with the error's type, message and cause chain attached
    #[track_caller]
    pub fn exception<E: std::error::Error>(&self, message: impl Into<String>, err: &E) {
        if !self.is_enabled_for(LogLevel::Error) {
            return;
        }
        let record = self
            .make_record(LogLevel::Error, message.into(), Location::caller())
            .with_exception(ExceptionInfo::from_error(err));
        self.handle(record);
    }

    /// Submit a fully built record, subject to the level check
    pub fn log_record(&self, record: LogRecord) {
        if self.is_enabled_for(record.level) {
            self.handle(record);
        }
    }

    fn make_record(&self, level: LogLevel, message: String, location: &Location<'_>) -> LogRecord {
        LogRecord::new(self.name(), level, message).with_location(location.file(), location.line(), "")
    }

    /// Deliver a record to this logger's handlers and its ancestors'.
    ///
    /// No level check on the logger itself; each handler applies its own
    /// threshold. A failing or panicking handler is reported on stderr and
    /// does not stop delivery to the others.
    pub fn handle(&self, mut record: LogRecord) {
        self.inner.metrics.record_emitted();
        let mut found = 0usize;

        let mut current = Some(self.clone());
        while let Some(logger) = current {
            for handler in logger.handlers() {
                found += 1;
                let mut handler = handler.lock();
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    handler.handle(&mut record)
                }));
                match outcome {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        eprintln!(
                            "[LOGGER ERROR] Handler '{}' on logger '{}' failed: {}",
                            handler.name(),
                            logger.name(),
                            e
                        );
                        self.inner.metrics.record_handler_error();
                    }
                    Err(panic_info) => {
                        let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = panic_info.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "Unknown panic".to_string()
                        };
                        eprintln!(
                            "[LOGGER ERROR] Handler '{}' on logger '{}' panicked: {}",
                            handler.name(),
                            logger.name(),
                            panic_msg
                        );
                        self.inner.metrics.record_handler_error();
                    }
                }
            }
            if !logger.propagate() {
                break;
            }
            current = logger.parent();
        }

        if found == 0 {
            self.inner.metrics.record_unhandled();
            if record.level >= LogLevel::Warning {
                eprintln!("{}", record.message());
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("propagate", &self.propagate())
            .field("mode", &self.mode())
            .field("handlers", &self.inner.handlers.read().len())
            .finish()
    }
}
