//! Rotating file handler
//!
//! Writes rendered records to a file and rotates it either by size (numbered
//! backups `app.log.1` .. `app.log.N`, 1 newest) or on a wall-clock schedule
//! (dated backups such as `app.log.2025-01-08`).

use crate::core::{Handler, LogLevel, LoggerError, Result, SharedFormatter};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Schedule unit for time-based rotation
///
/// # Examples
///
/// ```
/// use pipeline_log_toolkit::handlers::When;
///
/// assert_eq!("midnight".parse::<When>().unwrap(), When::Midnight);
/// assert_eq!("W0".parse::<When>().unwrap(), When::Weekday(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum When {
    Seconds,
    Minutes,
    Hours,
    Days,
    /// Roll over at local midnight
    Midnight,
    /// Roll over at the midnight ending the given weekday (0 = Monday)
    Weekday(u8),
}

impl When {
    /// strftime pattern of the backup suffix
    pub fn suffix_format(&self) -> &'static str {
        match self {
            When::Seconds => "%Y-%m-%d_%H-%M-%S",
            When::Minutes => "%Y-%m-%d_%H-%M",
            When::Hours => "%Y-%m-%d_%H",
            When::Days | When::Midnight | When::Weekday(_) => "%Y-%m-%d",
        }
    }

    /// Length of one rotation period
    fn period(&self, interval: u32) -> Duration {
        let interval = i64::from(interval);
        match self {
            When::Seconds => Duration::seconds(interval),
            When::Minutes => Duration::minutes(interval),
            When::Hours => Duration::hours(interval),
            When::Days | When::Midnight => Duration::days(interval),
            When::Weekday(_) => Duration::weeks(interval),
        }
    }

    /// First rollover instant strictly after `now`
    fn next_rollover(&self, now: NaiveDateTime, interval: u32) -> NaiveDateTime {
        let next_midnight = || {
            let date = now.date() + Duration::days(1);
            date.and_hms_opt(0, 0, 0).unwrap_or(now)
        };
        match self {
            When::Midnight => next_midnight() + Duration::days(i64::from(interval.max(1)) - 1),
            When::Weekday(day) => {
                let today = now.weekday().num_days_from_monday() as i64;
                let wait = (i64::from(*day) - today).rem_euclid(7);
                next_midnight() + Duration::days(wait)
            }
            _ => now + self.period(interval),
        }
    }
}

impl FromStr for When {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "S" => Ok(When::Seconds),
            "M" => Ok(When::Minutes),
            "H" => Ok(When::Hours),
            "D" => Ok(When::Days),
            "MIDNIGHT" => Ok(When::Midnight),
            _ => {
                let day = upper
                    .strip_prefix('W')
                    .and_then(|d| d.parse::<u8>().ok())
                    .filter(|d| *d <= 6);
                day.map(When::Weekday).ok_or_else(|| {
                    LoggerError::config("rotation", format!("invalid rollover unit '{}'", s))
                })
            }
        }
    }
}

impl TryFrom<String> for When {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<When> for String {
    fn from(when: When) -> Self {
        when.to_string()
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            When::Seconds => write!(f, "S"),
            When::Minutes => write!(f, "M"),
            When::Hours => write!(f, "H"),
            When::Days => write!(f, "D"),
            When::Midnight => write!(f, "MIDNIGHT"),
            When::Weekday(day) => write!(f, "W{}", day),
        }
    }
}

/// Rotation strategy defining when to rotate log files
///
/// # Examples
///
/// ```
/// use pipeline_log_toolkit::handlers::{RotationStrategy, When};
///
/// // Rotate before a write would push the file past 10 MB
/// let size_strategy = RotationStrategy::size(10 * 1024 * 1024);
///
/// // Rotate every night at local midnight
/// let time_strategy = RotationStrategy::time(When::Midnight, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationStrategy {
    /// Rotate when the next write would take the file past `max_bytes`
    Size { max_bytes: u64 },

    /// Rotate every `interval` units of `when`
    Time { when: When, interval: u32 },

    /// No rotation
    Never,
}

impl Default for RotationStrategy {
    fn default() -> Self {
        RotationStrategy::Size {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

impl RotationStrategy {
    #[must_use]
    pub fn size(max_bytes: u64) -> Self {
        RotationStrategy::Size { max_bytes }
    }

    #[must_use]
    pub fn time(when: When, interval: u32) -> Self {
        RotationStrategy::Time { when, interval }
    }

    #[must_use]
    pub fn never() -> Self {
        RotationStrategy::Never
    }
}

/// Rotation settings for [`RotatingFileHandler`]
///
/// # Examples
///
/// ```
/// use pipeline_log_toolkit::handlers::{RotationPolicy, RotationStrategy};
///
/// let policy = RotationPolicy::new()
///     .with_strategy(RotationStrategy::size(50 * 1024 * 1024))
///     .with_backup_count(7)
///     .with_compression(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub strategy: RotationStrategy,
    /// Rotated files to keep. 0 keeps all dated backups and disables size rotation.
    pub backup_count: usize,
    /// Gzip numbered backups (size rotation only)
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::default(),
            backup_count: 5,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Shorthand for `with_strategy(RotationStrategy::size(max_bytes))`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, max_bytes: u64) -> Self {
        self.strategy = RotationStrategy::Size { max_bytes };
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_backup_count(mut self, count: usize) -> Self {
        self.backup_count = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    fn validate(&self) -> Result<()> {
        match self.strategy {
            RotationStrategy::Time { interval: 0, .. } => Err(LoggerError::config(
                "rotation",
                "rollover interval must be at least 1",
            )),
            _ => Ok(()),
        }
    }
}

/// File handler with size or time based rotation
///
/// # Examples
///
/// ```no_run
/// use pipeline_log_toolkit::formatters::TextFormatter;
/// use pipeline_log_toolkit::handlers::{RotatingFileHandler, RotationPolicy};
/// use pipeline_log_toolkit::LogLevel;
/// use std::sync::Arc;
///
/// let handler = RotatingFileHandler::new(
///     "/var/log/etl/app.log",
///     RotationPolicy::new().with_max_size(1024 * 1024),
///     LogLevel::Info,
///     Arc::new(TextFormatter::default()),
/// )
/// .unwrap();
/// ```
pub struct RotatingFileHandler {
    base_path: PathBuf,
    policy: RotationPolicy,
    level: LogLevel,
    formatter: SharedFormatter,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    /// Next scheduled rollover, local wall-clock time
    rollover_at: Option<NaiveDateTime>,
    closed: bool,
}

impl RotatingFileHandler {
    /// Open (or create) `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the file
    /// cannot be opened.
    pub fn new<P: AsRef<Path>>(
        path: P,
        policy: RotationPolicy,
        level: LogLevel,
        formatter: SharedFormatter,
    ) -> Result<Self> {
        policy.validate()?;
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size, modified) = open_append(&base_path)?;
        let rollover_at = match policy.strategy {
            RotationStrategy::Time { when, interval } => Some(when.next_rollover(modified, interval)),
            _ => None,
        };

        Ok(Self {
            base_path,
            policy,
            level,
            formatter,
            writer: Some(BufWriter::new(file)),
            current_size,
            rollover_at,
            closed: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn rollover_at(&self) -> Option<NaiveDateTime> {
        self.rollover_at
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        match self.policy.strategy {
            RotationStrategy::Never => false,
            RotationStrategy::Size { max_bytes } => {
                max_bytes > 0
                    && self.policy.backup_count > 0
                    && self.current_size > 0
                    && self.current_size + incoming > max_bytes
            }
            RotationStrategy::Time { .. } => self
                .rollover_at
                .is_some_and(|at| Local::now().naive_local() >= at),
        }
    }

    fn close_writer(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn reopen(&mut self) -> Result<()> {
        let (file, size, _) = open_append(&self.base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.close_writer()?;
        match self.policy.strategy {
            RotationStrategy::Size { .. } => self.rotate_numbered()?,
            RotationStrategy::Time { when, interval } => self.rotate_dated(when, interval)?,
            RotationStrategy::Never => {}
        }
        self.reopen()
    }

    /// Shift `.1 .. .N-1` up by one and move the active file to `.1`
    fn rotate_numbered(&mut self) -> Result<()> {
        let count = self.policy.backup_count;

        for stale in [self.backup_path(count), gz_path(&self.backup_path(count))] {
            if stale.exists() {
                fs::remove_file(&stale).map_err(|e| {
                    LoggerError::file_rotation(
                        stale.display().to_string(),
                        format!("Failed to remove oldest backup: {}", e),
                    )
                })?;
            }
        }

        for i in (1..count).rev() {
            let from = self.backup_path(i);
            let to = self.backup_path(i + 1);
            for (from, to) in [(gz_path(&from), gz_path(&to)), (from, to)] {
                if from.exists() {
                    replace_file(&from, &to)?;
                }
            }
        }

        let first = self.backup_path(1);
        if self.base_path.exists() {
            replace_file(&self.base_path, &first)?;
            if self.policy.compress {
                compress_file(&first)?;
            }
        }
        Ok(())
    }

    /// Move the active file to a dated backup and prune old ones
    fn rotate_dated(&mut self, when: When, interval: u32) -> Result<()> {
        let now = Local::now().naive_local();
        let rollover_at = self.rollover_at.unwrap_or(now);
        let period_start = rollover_at - when.period(interval);

        let mut target = self.base_path.clone().into_os_string();
        target.push(format!(".{}", period_start.format(when.suffix_format())));
        let target = PathBuf::from(target);

        if self.base_path.exists() {
            replace_file(&self.base_path, &target)?;
        }

        if self.policy.backup_count > 0 {
            for expired in self.expired_backups(when)? {
                if let Err(e) = fs::remove_file(&expired) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove old backup {}: {}",
                        expired.display(),
                        e
                    );
                }
            }
        }

        let mut next = when.next_rollover(now, interval);
        while next <= now {
            next += when.period(interval);
        }
        self.rollover_at = Some(next);
        Ok(())
    }

    /// Dated backups beyond `backup_count`, oldest first
    fn expired_backups(&self, when: When) -> Result<Vec<PathBuf>> {
        let dir = match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = format!("{}.", file_name(&self.base_path));
        let shape = suffix_shape(when.suffix_format());

        let mut backups: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                let name = file_name(path);
                name.strip_prefix(&prefix)
                    .is_some_and(|suffix| matches_shape(suffix, &shape))
            })
            .collect();

        if backups.len() <= self.policy.backup_count {
            return Ok(Vec::new());
        }
        backups.sort();
        let excess = backups.len() - self.policy.backup_count;
        backups.truncate(excess);
        Ok(backups)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone().into_os_string();
        path.push(format!(".{}", index));
        PathBuf::from(path)
    }

    #[cfg(test)]
    fn force_rollover_at(&mut self, at: NaiveDateTime) {
        self.rollover_at = Some(at);
    }
}

impl Handler for RotatingFileHandler {
    fn name(&self) -> &str {
        "rotating_file"
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
        if self.closed {
            return Err(LoggerError::handler_closed(self.base_path.display().to_string()));
        }

        let bytes = rendered.len() as u64 + 1;
        if self.should_rotate(bytes) {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                if self.writer.is_none() {
                    self.reopen()?;
                }
                // Keep the size check from retrying on every record
                self.current_size = 0;
            }
        }

        let path = &self.base_path;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::handler_closed(path.display().to_string()))?;
        writeln!(writer, "{}", rendered)
            .and_then(|_| writer.flush())
            .map_err(|e| {
                LoggerError::file_handler(
                    path.display().to_string(),
                    format!("Failed to write log record: {}", e),
                )
            })?;
        self.current_size += bytes;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_handler(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_handler(
                    self.base_path.display().to_string(),
                    format!("Failed to flush on close: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileHandler {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

fn open_append(path: &Path) -> Result<(File, u64, NaiveDateTime)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::file_handler(path.display().to_string(), format!("Failed to open: {}", e))
        })?;
    let metadata = file.metadata().map_err(|e| {
        LoggerError::file_handler(
            path.display().to_string(),
            format!("Cannot access file metadata: {}", e),
        )
    })?;
    let modified = metadata
        .modified()
        .map(|t| DateTime::<Local>::from(t).naive_local())
        .unwrap_or_else(|_| Local::now().naive_local());
    Ok((file, metadata.len(), modified))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn gz_path(path: &Path) -> PathBuf {
    let mut gz = path.as_os_str().to_owned();
    gz.push(".gz");
    PathBuf::from(gz)
}

/// Rename, replacing an existing destination on platforms where rename won't
fn replace_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).map_err(|e| {
        LoggerError::file_rotation(
            from.display().to_string(),
            format!("Failed to move to '{}': {}", to.display(), e),
        )
    })
}

/// `%Y-%m-%d_%H` becomes `dddd-dd-dd_dd`, where `d` stands for any digit
fn suffix_shape(pattern: &str) -> String {
    let mut shape = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.next() {
                Some('Y') => shape.push_str("dddd"),
                Some(_) => shape.push_str("dd"),
                None => {}
            }
        } else {
            shape.push(c);
        }
    }
    shape
}

fn matches_shape(suffix: &str, shape: &str) -> bool {
    suffix.len() == shape.len()
        && suffix.chars().zip(shape.chars()).all(|(c, s)| match s {
            'd' => c.is_ascii_digit(),
            _ => c == s,
        })
}

/// Gzip `path` to `path.gz`, removing the original only once the archive is
/// complete.
fn compress_file(path: &Path) -> Result<()> {
    use std::io::{BufReader, Read};

    let gz = gz_path(path);
    let mut temp = gz.clone().into_os_string();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let mut buffer = vec![0u8; 64 * 1024];
    let streamed: std::io::Result<()> = (|| {
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            encoder.write_all(&buffer[..n])?;
        }
        encoder.finish()?.flush()
    })();

    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp, &gz).map_err(|e| {
        let _ = fs::remove_file(&temp);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but could not remove the original: {}",
            path.display(),
            e
        );
    }
    Ok(())
}
