//! Core logger types and traits

pub mod error;
pub mod handler;
pub mod log_context;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod timestamp;

pub use error::{LoggerError, Result};
pub use handler::{same_handler, shared, Handler, SharedFormatter, SharedHandler};
pub use log_context::{FieldValue, LogContext};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerMode, DEFAULT_ROOT_LEVEL, ROOT_LOGGER_NAME};
pub use metrics::LoggerMetrics;
pub use record::{short_type_name, ExceptionInfo, LogRecord};
pub use registry::{BasicConfig, LoggerOptions, LoggerRegistry};
pub use timestamp::{
    make_timezone_converter, TimeConverter, DEFAULT_DATE_FORMAT, FILE_TIMESTAMP_FORMAT,
};
