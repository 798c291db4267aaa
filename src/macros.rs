//! Logging macros with `format!` syntax.
//!
//! Unlike the [`Logger`](crate::Logger) methods, the macros also record the
//! name of the calling function, and they skip formatting entirely when the
//! level is disabled.
//!
//! # Examples
//!
//! ```
//! use pipeline_log_toolkit::{info, warning, LogLevel, Logger};
//!
//! let logger = Logger::new("etl.bronze");
//!
//! info!(logger, "Batch started");
//!
//! let rows = 1200;
//! warning!(logger, "Loaded {} rows, {} rejected", rows, 3);
//! ```

/// Name of the function the macro is expanded in
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        let name = name.trim_end_matches("::{{closure}}");
        match name.rfind("::") {
            Some(pos) => &name[pos + 2..],
            None => name,
        }
    }};
}

/// Log a message at the given level.
///
/// # Examples
///
/// ```
/// # use pipeline_log_toolkit::{LogLevel, Logger};
/// # let logger = Logger::new("etl");
/// use pipeline_log_toolkit::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        let level: $crate::LogLevel = $level;
        if logger.is_enabled_for(level) {
            logger.log_record(
                $crate::LogRecord::new(logger.name(), level, ::std::format!($($arg)+))
                    .with_location(::std::file!(), ::std::line!(), $crate::__function_name!()),
            );
        }
    }};
}

/// Log a trace-level message.
///
/// ```
/// # use pipeline_log_toolkit::{LogLevel, Logger};
/// # let logger = Logger::new("etl");
/// # logger.set_level(LogLevel::Trace);
/// use pipeline_log_toolkit::trace;
/// trace!(logger, "Entering partition {}", 7);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// ```
/// # use pipeline_log_toolkit::Logger;
/// # let logger = Logger::new("etl");
/// use pipeline_log_toolkit::info;
/// info!(logger, "Processing {} files", 12);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use pipeline_log_toolkit::Logger;
/// # let logger = Logger::new("etl");
/// use pipeline_log_toolkit::error;
/// error!(logger, "Write to {} failed: {}", "silver.orders", "disk full");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::shared;
    use crate::handlers::CaptureHandler;
    use crate::{LogLevel, Logger};

    fn setup() -> (Logger, CaptureHandler) {
        let logger = Logger::new("etl.macros");
        logger.set_level(LogLevel::Info);
        let capture = CaptureHandler::new(LogLevel::Trace);
        logger.add_handler(shared(capture.clone()));
        (logger, capture)
    }

    #[test]
    fn test_macros_format_and_locate() {
        let (logger, capture) = setup();
        info!(logger, "rows={}", 10);
        warning!(logger, "late by {}s", 3);
        error!(logger, "failed");
        critical!(logger, "down");

        let records = capture.records();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].message(), "rows=10");
        assert_eq!(records[1].level, LogLevel::Warning);
        assert_eq!(records[3].level, LogLevel::Critical);
        assert_eq!(records[0].function, "test_macros_format_and_locate");
        assert_eq!(records[0].module, "macros");
        assert!(records[0].line > 0);
    }

    #[test]
    fn test_disabled_level_is_skipped() {
        let (logger, capture) = setup();
        debug!(logger, "hidden {}", 1);
        trace!(logger, "hidden");
        assert!(capture.is_empty());

        log!(logger, LogLevel::Info, "shown");
        assert_eq!(capture.messages(), vec!["shown"]);
    }

    #[test]
    fn test_function_name_inside_closure() {
        let (logger, capture) = setup();
        let run = || info!(logger, "from closure");
        run();
        assert_eq!(capture.records()[0].function, "test_function_name_inside_closure");
    }
}
