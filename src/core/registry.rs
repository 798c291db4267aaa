//! Logger registry
//!
//! Maps logger names to one shared [`Logger`] each and maintains the
//! dot-separated hierarchy below a root logger. A registry is an ordinary
//! value: create one at startup and pass it by reference; tests create their
//! own.

use super::{
    error::Result,
    handler::{shared, SharedHandler},
    log_level::LogLevel,
    logger::{Logger, LoggerMode, ROOT_LOGGER_NAME},
};
use crate::formatters::{ColoredFormatter, FormatterConfig, TextFormatter};
use crate::handlers::ConsoleHandler;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// How [`LoggerRegistry::get`] configures a logger
///
/// # Examples
///
/// ```
/// use pipeline_log_toolkit::{LogLevel, LoggerOptions};
///
/// // production: exactly these handlers, no propagation
/// let options = LoggerOptions::new().with_level(LogLevel::Info);
///
/// // test capture: strip handlers, always propagate
/// let options = LoggerOptions::test_capture();
/// ```
#[derive(Clone, Default)]
pub struct LoggerOptions {
    pub level: Option<LogLevel>,
    /// Replaces the logger's handlers when non-empty (production mode only)
    pub handlers: Vec<SharedHandler>,
    /// Production-mode propagation; `None` means `false`
    pub propagate: Option<bool>,
    pub test_capture: bool,
}

impl LoggerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn test_capture() -> Self {
        Self {
            test_capture: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn with_handler(mut self, handler: SharedHandler) -> Self {
        self.handlers.push(handler);
        self
    }

    #[must_use]
    pub fn with_handlers(mut self, handlers: Vec<SharedHandler>) -> Self {
        self.handlers = handlers;
        self
    }

    #[must_use]
    pub fn with_propagate(mut self, propagate: bool) -> Self {
        self.propagate = Some(propagate);
        self
    }

    #[must_use]
    pub fn with_test_capture(mut self, enabled: bool) -> Self {
        self.test_capture = enabled;
        self
    }
}

/// Settings for [`LoggerRegistry::configure_basic`]
#[derive(Debug, Clone)]
pub struct BasicConfig {
    pub level: LogLevel,
    pub formatter: FormatterConfig,
    pub use_colors: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            formatter: FormatterConfig::default(),
            use_colors: true,
        }
    }
}

impl BasicConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: FormatterConfig) -> Self {
        self.formatter = formatter;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

/// Process-wide map of named loggers
pub struct LoggerRegistry {
    root: Logger,
    loggers: RwLock<HashMap<String, Logger>>,
}

impl LoggerRegistry {
    /// Fresh registry with a root logger at WARNING
    pub fn new() -> Self {
        Self {
            root: Logger::root(),
            loggers: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> Logger {
        self.root.clone()
    }

    /// Get or create the logger called `name`.
    ///
    /// An empty name or `"root"` yields the root logger. A new logger is
    /// parented to its nearest registered ancestor, and registered loggers
    /// below it are re-parented to it.
    pub fn logger(&self, name: &str) -> Logger {
        if name.is_empty() || name == ROOT_LOGGER_NAME {
            return self.root();
        }
        if let Some(existing) = self.loggers.read().get(name) {
            return existing.clone();
        }

        let mut loggers = self.loggers.write();
        if let Some(existing) = loggers.get(name) {
            return existing.clone();
        }

        let logger = Logger::new(name);
        let parent = ancestors(name)
            .find_map(|ancestor| loggers.get(ancestor).cloned())
            .unwrap_or_else(|| self.root());
        logger.set_parent(Some(parent));

        let prefix = format!("{}.", name);
        for other in loggers.values() {
            if !other.name().starts_with(&prefix) {
                continue;
            }
            let reparent = other
                .parent()
                .map_or(true, |p| !p.name().starts_with(&prefix));
            if reparent {
                other.set_parent(Some(logger.clone()));
            }
        }

        loggers.insert(name.to_string(), logger.clone());
        logger
    }

    /// Get a logger and apply `options`.
    ///
    /// Test capture strips the logger's handlers and forces propagation on,
    /// ignoring `options.propagate`. Production mode replaces the handler set
    /// when `options.handlers` is non-empty and sets propagation to
    /// `options.propagate`, defaulting to `false`. A given level is applied in
    /// both modes.
    pub fn get(&self, name: &str, options: LoggerOptions) -> Logger {
        let logger = self.logger(name);

        if options.test_capture {
            logger.clear_handlers();
            logger.set_propagate(true);
            logger.set_mode(LoggerMode::TestCapture);
        } else {
            if !options.handlers.is_empty() {
                logger.set_handlers(options.handlers);
            }
            logger.set_propagate(options.propagate.unwrap_or(false));
            logger.set_mode(LoggerMode::Production);
        }

        if let Some(level) = options.level {
            logger.set_level(level);
        }
        logger
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Reset the root logger to one console handler.
    ///
    /// # Errors
    ///
    /// Fails on a malformed template or date pattern.
    pub fn configure_basic(&self, config: BasicConfig) -> Result<Logger> {
        let handler: SharedHandler = if config.use_colors {
            let formatter = ColoredFormatter::new(config.formatter, true)?;
            shared(ConsoleHandler::new(config.level, Arc::new(formatter)))
        } else {
            let formatter = TextFormatter::new(config.formatter)?;
            shared(ConsoleHandler::new(config.level, Arc::new(formatter)))
        };
        Ok(self.install_root_handler(config.level, handler))
    }

    fn install_root_handler(&self, level: LogLevel, handler: SharedHandler) -> Logger {
        let root = self.root();
        for old in root.clear_handlers() {
            if let Err(e) = old.lock().close() {
                eprintln!("[LOGGER WARNING] Failed to close replaced root handler: {}", e);
            }
        }
        root.set_level(level);
        root.add_handler(handler);
        root
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `a.b.c` yields `a.b`, then `a`
fn ancestors(name: &str) -> impl Iterator<Item = &str> {
    name.rmatch_indices('.').map(move |(i, _)| &name[..i])
}
