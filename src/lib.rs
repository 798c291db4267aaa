//! # Pipeline Log Toolkit
//!
//! Logging and instrumentation for batch data pipelines.
//!
//! ## Features
//!
//! - **Formatters**: `%`/`{`/`$` text templates, ANSI-colored console output
//!   and one-object-per-line JSON
//! - **Rotating files**: size-based or calendar-based rotation with backup
//!   pruning and optional gzip compression
//! - **Timezones**: timestamps rendered in any IANA zone
//! - **Logger hierarchy**: dot-separated names, level inheritance and
//!   propagation, plus a test-capture mode for assertions
//! - **Instrumentation**: operation timers, run metrics and dataset summaries
//!
//! ## Quick start
//!
//! ```no_run
//! use pipeline_log_toolkit::prelude::*;
//!
//! # fn main() -> pipeline_log_toolkit::Result<()> {
//! let registry = LoggerRegistry::new();
//! let session = setup_file_logging(
//!     &registry,
//!     FileLoggingConfig::new("etl.bronze").with_json_format(true),
//! )?;
//!
//! let rows = LogTimer::new(&session, "load orders").time(|| 1200);
//! session.info(format!("loaded {} rows", rows));
//!
//! for error in session.close() {
//!     eprintln!("close failed: {}", error);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod formatters;
pub mod handlers;
pub mod instrument;
pub mod macros;
pub mod session;

pub mod prelude {
    pub use crate::core::{
        shared as shared_handler, BasicConfig, FieldValue, Handler, LogContext, LogLevel,
        LogRecord, Logger, LoggerError, LoggerMode, LoggerOptions, LoggerRegistry, Result,
        SharedHandler,
    };
    pub use crate::formatters::{
        ColoredFormatter, FormatStyle, Formatter, FormatterConfig, JsonFormatter, TextFormatter,
    };
    pub use crate::handlers::{ConsoleHandler, RotatingFileHandler, RotationPolicy, When};
    pub use crate::instrument::{
        log_dataset_info, DatasetReportOptions, LogMetrics, LogTimer, TabularSource,
    };
    pub use crate::session::{setup_file_logging, FileLoggingConfig, FileLoggingSession};
}

pub use core::{
    make_timezone_converter, same_handler, shared as shared_handler, BasicConfig, ExceptionInfo,
    FieldValue, Handler, LogContext, LogLevel, LogRecord, Logger, LoggerError, LoggerMetrics,
    LoggerMode, LoggerOptions, LoggerRegistry, Result, SharedFormatter, SharedHandler,
    TimeConverter,
};
pub use formatters::{ColoredFormatter, FormatStyle, Formatter, FormatterConfig, JsonFormatter, TextFormatter};
pub use handlers::{
    console_handler, size_rotating_file_handler, timed_rotating_file_handler, CaptureHandler,
    ConsoleHandler, RotatingFileHandler, RotationPolicy, RotationStrategy, When,
};
pub use instrument::{log_dataset_info, DatasetReportOptions, LogMetrics, LogTimer, TabularSource};
pub use session::{setup_file_logging, FileLoggingConfig, FileLoggingSession, RotationMode};
