//! File logging sessions
//!
//! [`setup_file_logging`] wires a timezone-aware formatter, a rotating file
//! handler and an optional console handler onto a named logger, and returns a
//! [`FileLoggingSession`] whose [`close`](FileLoggingSession::close) releases
//! them.

use crate::core::{
    shared, LogLevel, Logger, LoggerError, LoggerOptions, LoggerRegistry, Result, SharedFormatter,
    SharedHandler, TimeConverter, DEFAULT_DATE_FORMAT, FILE_TIMESTAMP_FORMAT,
};
use crate::formatters::{
    ColoredFormatter, FormatStyle, FormatterConfig, JsonFormatter, TextFormatter,
    DEFAULT_LOG_FORMAT,
};
use crate::handlers::{
    check_encoding, console_handler, RotatingFileHandler, RotationPolicy, RotationStrategy, When,
    DEFAULT_ENCODING, DEFAULT_MAX_BYTES,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File rotation mode of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    /// Rotate on a wall-clock schedule (`when` / `interval`)
    #[default]
    Time,
    /// Rotate before the file would exceed `max_bytes`
    Size,
}

/// Everything [`setup_file_logging`] needs
///
/// Every field has a default, so a JSON document only has to name what it
/// changes:
///
/// ```
/// use pipeline_log_toolkit::session::{FileLoggingConfig, RotationMode};
/// use pipeline_log_toolkit::LogLevel;
///
/// let config = FileLoggingConfig::from_json_str(
///     r#"{"logger_name": "etl.bronze", "rotation": "size", "level": "INFO", "json_format": true}"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.rotation, RotationMode::Size);
/// assert_eq!(config.level, LogLevel::Info);
/// assert_eq!(config.timezone, "America/Sao_Paulo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub logger_name: String,
    pub log_dir: PathBuf,
    /// Sub-folder of `log_dir`
    pub log_folder: String,
    /// File name prefix; defaults to the logger name with `.` replaced by `_`
    pub file_prefix: Option<String>,
    /// Logger and file handler threshold
    pub level: LogLevel,
    pub console_level: LogLevel,
    pub rotation: RotationMode,
    /// Schedule unit for time rotation
    pub when: When,
    pub interval: u32,
    pub max_bytes: u64,
    pub backup_count: usize,
    /// Gzip size-rotated backups
    pub compress_backups: bool,
    pub add_console: bool,
    pub use_colors: bool,
    pub log_format: String,
    pub date_format: String,
    pub format_style: FormatStyle,
    /// IANA zone for rendered timestamps and the file name
    pub timezone: String,
    pub json_format: bool,
    pub encoding: String,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            logger_name: String::new(),
            log_dir: PathBuf::from("./logs/"),
            log_folder: "unknown/".to_string(),
            file_prefix: None,
            level: LogLevel::Debug,
            console_level: LogLevel::Info,
            rotation: RotationMode::Time,
            when: When::Midnight,
            interval: 1,
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: 5,
            compress_backups: false,
            add_console: true,
            use_colors: true,
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            format_style: FormatStyle::Percent,
            timezone: "America/Sao_Paulo".to_string(),
            json_format: false,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl FileLoggingConfig {
    #[must_use]
    pub fn new(logger_name: impl Into<String>) -> Self {
        Self {
            logger_name: logger_name.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::JsonError`] for malformed JSON or unknown enum
    /// values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    #[must_use]
    pub fn with_log_folder(mut self, log_folder: impl Into<String>) -> Self {
        self.log_folder = log_folder.into();
        self
    }

    #[must_use]
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_console_level(mut self, level: LogLevel) -> Self {
        self.console_level = level;
        self
    }

    /// Time rotation every `interval` units of `when`
    #[must_use]
    pub fn with_time_rotation(mut self, when: When, interval: u32) -> Self {
        self.rotation = RotationMode::Time;
        self.when = when;
        self.interval = interval;
        self
    }

    /// Size rotation at `max_bytes`
    #[must_use]
    pub fn with_size_rotation(mut self, max_bytes: u64) -> Self {
        self.rotation = RotationMode::Size;
        self.max_bytes = max_bytes;
        self
    }

    #[must_use]
    pub fn with_backup_count(mut self, count: usize) -> Self {
        self.backup_count = count;
        self
    }

    #[must_use]
    pub fn with_compressed_backups(mut self, enabled: bool) -> Self {
        self.compress_backups = enabled;
        self
    }

    #[must_use]
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.add_console = enabled;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.use_colors = enabled;
        self
    }

    #[must_use]
    pub fn with_log_format(mut self, format: impl Into<String>) -> Self {
        self.log_format = format.into();
        self
    }

    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    #[must_use]
    pub fn with_format_style(mut self, style: FormatStyle) -> Self {
        self.format_style = style;
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    #[must_use]
    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Prefix used in the file name
    pub fn resolved_prefix(&self) -> String {
        self.file_prefix
            .clone()
            .unwrap_or_else(|| self.logger_name.replace('.', "_"))
    }

    fn text_config(&self) -> FormatterConfig {
        FormatterConfig::new()
            .with_format(self.log_format.clone())
            .with_date_format(self.date_format.clone())
            .with_style(self.format_style)
    }

    fn rotation_policy(&self) -> RotationPolicy {
        let strategy = match self.rotation {
            RotationMode::Time => RotationStrategy::time(self.when, self.interval),
            RotationMode::Size => RotationStrategy::size(self.max_bytes),
        };
        RotationPolicy::new()
            .with_strategy(strategy)
            .with_backup_count(self.backup_count)
            .with_compression(self.compress_backups)
    }
}

/// A configured logger plus the handlers it owns.
///
/// Derefs to [`Logger`]. Call [`close`](Self::close) exactly once when done;
/// dropping an unclosed session closes it as a fallback.
pub struct FileLoggingSession {
    logger: Logger,
    log_file: PathBuf,
    closed: bool,
}

impl FileLoggingSession {
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Path of the active log file
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Flush, close and detach every handler attached to the logger.
    ///
    /// A handler that fails to flush or close is reported on stderr and
    /// returned; the remaining handlers are still closed.
    pub fn close(mut self) -> Vec<LoggerError> {
        self.close_handlers()
    }

    fn close_handlers(&mut self) -> Vec<LoggerError> {
        self.closed = true;
        let mut failures = Vec::new();

        for handler in self.logger.handlers() {
            {
                let mut guard = handler.lock();
                let name = guard.name().to_string();
                for result in [guard.flush(), guard.close()] {
                    if let Err(e) = result {
                        eprintln!("[LOGGER ERROR] Failed to close handler '{}': {}", name, e);
                        failures.push(e);
                    }
                }
            }
            self.logger.remove_handler(&handler);
        }
        failures
    }
}

impl Deref for FileLoggingSession {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.logger
    }
}

impl Drop for FileLoggingSession {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close_handlers();
        }
    }
}

impl fmt::Debug for FileLoggingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLoggingSession")
            .field("logger", &self.logger.name())
            .field("log_file", &self.log_file)
            .field("closed", &self.closed)
            .finish()
    }
}

/// Build a file-logging session on `registry`.
///
/// The file lands in `log_dir/log_folder/{timestamp}-{prefix}.{log|json}`,
/// `timestamp` being the current time in the configured zone. The logger is
/// registered in production mode with exactly the file handler and, if
/// requested, a console handler, and does not propagate.
///
/// # Errors
///
/// Fails fast on an empty logger name, an unknown timezone, an unsupported
/// encoding, a malformed format, or an output directory that cannot be
/// created.
///
/// # Examples
///
/// ```no_run
/// use pipeline_log_toolkit::session::{setup_file_logging, FileLoggingConfig};
/// use pipeline_log_toolkit::LoggerRegistry;
///
/// let registry = LoggerRegistry::new();
/// let session = setup_file_logging(
///     &registry,
///     FileLoggingConfig::new("etl.bronze")
///         .with_log_dir("/var/log/pipelines/")
///         .with_size_rotation(5 * 1024 * 1024)
///         .with_json_format(true),
/// )
/// .unwrap();
///
/// session.info("ingest started");
/// let failures = session.close();
/// assert!(failures.is_empty());
/// ```
pub fn setup_file_logging(
    registry: &LoggerRegistry,
    config: FileLoggingConfig,
) -> Result<FileLoggingSession> {
    if config.logger_name.is_empty() {
        return Err(LoggerError::config("session", "logger name must not be empty"));
    }
    check_encoding(&config.encoding)?;

    let converter = TimeConverter::for_timezone(&config.timezone)?;

    let (file_formatter, console_formatter): (SharedFormatter, Option<SharedFormatter>) =
        if config.json_format {
            let json: SharedFormatter =
                Arc::new(JsonFormatter::new().with_converter(converter.clone()));
            let console = config.add_console.then(|| Arc::clone(&json));
            (json, console)
        } else {
            let text = TextFormatter::new(config.text_config())?.with_converter(converter.clone());
            let console = if config.add_console {
                let colored = ColoredFormatter::new(config.text_config(), config.use_colors)?
                    .with_converter(converter.clone());
                Some(Arc::new(colored) as SharedFormatter)
            } else {
                None
            };
            (Arc::new(text) as SharedFormatter, console)
        };

    let dir = config.log_dir.join(&config.log_folder);
    fs::create_dir_all(&dir).map_err(|e| {
        LoggerError::io_operation(
            "create log directory",
            format!("Failed to create directory '{}'", dir.display()),
            e,
        )
    })?;

    let timestamp = converter.now().format(FILE_TIMESTAMP_FORMAT);
    let extension = if config.json_format { "json" } else { "log" };
    let log_file = dir.join(format!("{}-{}.{}", timestamp, config.resolved_prefix(), extension));

    let file_handler = RotatingFileHandler::new(
        &log_file,
        config.rotation_policy(),
        config.level,
        file_formatter,
    )?;

    let mut handlers: Vec<SharedHandler> = vec![shared(file_handler)];
    if let Some(formatter) = console_formatter {
        handlers.push(shared(console_handler(config.console_level, formatter)));
    }

    let logger = registry.get(
        &config.logger_name,
        LoggerOptions::new()
            .with_level(config.level)
            .with_handlers(handlers)
            .with_propagate(false),
    );
    logger.info(format!("Logger configured: json_format={}", config.json_format));

    Ok(FileLoggingSession {
        logger,
        log_file,
        closed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quiet(name: &str, dir: &Path) -> FileLoggingConfig {
        FileLoggingConfig::new(name)
            .with_log_dir(dir)
            .with_log_folder("jobs")
            .with_console(false)
    }

    #[test]
    fn test_defaults() {
        let config = FileLoggingConfig::default();
        assert_eq!(config.log_folder, "unknown/");
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.console_level, LogLevel::Info);
        assert_eq!(config.rotation, RotationMode::Time);
        assert_eq!(config.when, When::Midnight);
        assert_eq!(config.max_bytes, 10_485_760);
        assert_eq!(config.backup_count, 5);
        assert!(config.add_console && config.use_colors && !config.json_format);
        assert_eq!(config.date_format, "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(FileLoggingConfig::new("etl.bronze.orders").resolved_prefix(), "etl_bronze_orders");
        assert_eq!(
            FileLoggingConfig::new("etl").with_file_prefix("custom").resolved_prefix(),
            "custom"
        );
    }

    #[test]
    fn test_json_config_rejects_unknown_rotation() {
        assert!(FileLoggingConfig::from_json_str(r#"{"rotation": "weekly"}"#).is_err());
        let config = FileLoggingConfig::from_json_str(r#"{"when": "H", "interval": 6}"#).unwrap();
        assert_eq!(config.when, When::Hours);
        assert_eq!(config.interval, 6);
    }

    #[test]
    fn test_file_name_and_text_output() {
        let dir = tempdir().unwrap();
        let registry = LoggerRegistry::new();
        let session = setup_file_logging(&registry, quiet("etl.gold", dir.path())).unwrap();

        let name = session.log_file().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-etl_gold.log"), "{}", name);
        // YYYYMMDD_HH:MM:SS
        assert_eq!(name.find('-'), Some(17));
        assert_eq!(session.log_file().parent().unwrap(), dir.path().join("jobs"));

        session.warning("late partition");
        let path = session.log_file().to_path_buf();
        assert!(session.close().is_empty());

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] etl.gold - Logger configured: json_format=false"));
        assert!(lines[1].ends_with("[WARNING] etl.gold - late partition"));
    }

    #[test]
    fn test_registers_production_logger() {
        let dir = tempdir().unwrap();
        let registry = LoggerRegistry::new();
        let session = setup_file_logging(
            &registry,
            FileLoggingConfig::new("etl.silver")
                .with_log_dir(dir.path())
                .with_level(LogLevel::Info),
        )
        .unwrap();

        let logger = registry.logger("etl.silver");
        assert_eq!(logger.handlers().len(), 2);
        assert!(!logger.propagate());
        assert_eq!(logger.level(), Some(LogLevel::Info));

        assert!(session.close().is_empty());
        assert!(!logger.has_handlers());
    }

    #[test]
    fn test_configuration_errors() {
        let dir = tempdir().unwrap();
        let registry = LoggerRegistry::new();

        let err = setup_file_logging(&registry, quiet("etl", dir.path()).with_timezone("Nowhere/City"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::UnknownTimezone { .. }));

        let err = setup_file_logging(&registry, quiet("etl", dir.path()).with_encoding("cp1252"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        assert!(setup_file_logging(&registry, quiet("", dir.path())).is_err());

        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();
        let err = setup_file_logging(&registry, quiet("etl", &blocker)).unwrap_err();
        assert!(matches!(err, LoggerError::IoOperation { .. }));
    }

    #[test]
    fn test_drop_closes_handlers() {
        let dir = tempdir().unwrap();
        let registry = LoggerRegistry::new();
        {
            let _session = setup_file_logging(&registry, quiet("etl.temp", dir.path())).unwrap();
        }
        assert!(!registry.logger("etl.temp").has_handlers());
    }
}
