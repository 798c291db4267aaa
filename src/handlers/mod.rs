//! Handler implementations and builders
//!
//! The builder functions return handlers with their level and formatter
//! already set. File builders create missing parent directories.

pub mod capture;
pub mod console;
pub mod rotating_file;

pub use capture::CaptureHandler;
pub use console::ConsoleHandler;
pub use rotating_file::{RotatingFileHandler, RotationPolicy, RotationStrategy, When};

pub use crate::core::{Handler, SharedFormatter, SharedHandler};

use crate::core::{LogLevel, LoggerError, Result};
use std::path::Path;

/// Default size limit for size-rotated files (10 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 10_485_760;

pub const DEFAULT_SIZE_BACKUP_COUNT: usize = 5;

pub const DEFAULT_TIME_BACKUP_COUNT: usize = 7;

pub const DEFAULT_ENCODING: &str = "utf-8";

/// Console handler on standard output
pub fn console_handler(level: LogLevel, formatter: SharedFormatter) -> ConsoleHandler {
    ConsoleHandler::new(level, formatter)
}

/// File handler rotating before a write would exceed `max_bytes`.
///
/// # Errors
///
/// Fails on an unsupported encoding or when the directory or file cannot be
/// created.
pub fn size_rotating_file_handler(
    path: impl AsRef<Path>,
    max_bytes: u64,
    backup_count: usize,
    encoding: &str,
    level: LogLevel,
    formatter: SharedFormatter,
) -> Result<RotatingFileHandler> {
    check_encoding(encoding)?;
    let policy = RotationPolicy::new()
        .with_max_size(max_bytes)
        .with_backup_count(backup_count);
    RotatingFileHandler::new(path, policy, level, formatter)
}

/// File handler rotating every `interval` units of `when`.
///
/// # Errors
///
/// Fails on an unsupported encoding, a zero interval, or when the directory
/// or file cannot be created.
pub fn timed_rotating_file_handler(
    path: impl AsRef<Path>,
    when: When,
    interval: u32,
    backup_count: usize,
    encoding: &str,
    level: LogLevel,
    formatter: SharedFormatter,
) -> Result<RotatingFileHandler> {
    check_encoding(encoding)?;
    let policy = RotationPolicy::new()
        .with_strategy(RotationStrategy::time(when, interval))
        .with_backup_count(backup_count);
    RotatingFileHandler::new(path, policy, level, formatter)
}

/// Files are always written as UTF-8
pub(crate) fn check_encoding(encoding: &str) -> Result<()> {
    match encoding.to_ascii_lowercase().replace('_', "-").as_str() {
        "utf-8" | "utf8" => Ok(()),
        _ => Err(LoggerError::config(
            "encoding",
            format!("unsupported encoding '{}', only utf-8 is available", encoding),
        )),
    }
}
