//! Log record structure

use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt::Write as _;
use std::path::Path;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

/// Get cached thread name, computing and caching it on first access
fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Strip the module path and generic parameters from a Rust type name.
///
/// `my_etl::errors::ValueError` becomes `ValueError`.
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Error details attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub type_name: String,
    pub message: String,
    pub traceback: String,
}

impl ExceptionInfo {
    pub fn new(
        type_name: impl Into<String>,
        message: impl Into<String>,
        traceback: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            traceback: traceback.into(),
        }
    }

    /// Capture an error value, its type name and its `source()` chain.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let type_name = short_type_name(std::any::type_name::<E>()).to_string();
        let message = err.to_string();

        let mut traceback = format!("{}: {}", type_name, message);
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = write!(traceback, "\nCaused by: {}", cause);
            source = cause.source();
        }

        Self {
            type_name,
            message,
            traceback,
        }
    }
}

/// One log event as it travels through loggers and handlers.
///
/// `level_name` and `msg` are the two fields a formatter may rewrite while
/// rendering; formatters must leave them as they found them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub name: String,
    pub level: LogLevel,
    pub level_name: String,
    /// Message template; `{}` placeholders are filled from `args`
    pub msg: String,
    pub args: Vec<FieldValue>,
    pub created: DateTime<Utc>,
    pub pathname: String,
    pub module: String,
    pub function: String,
    pub line: u32,
    pub thread_id: String,
    pub thread_name: Option<String>,
    pub process: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exc_info: Option<ExceptionInfo>,
    pub extra: LogContext,
}

impl LogRecord {
    pub fn new(name: impl Into<String>, level: LogLevel, msg: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level,
            level_name: level.to_str().to_string(),
            msg: msg.into(),
            args: Vec::new(),
            created: Utc::now(),
            pathname: String::new(),
            module: String::new(),
            function: String::new(),
            line: 0,
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            process: std::process::id(),
            exc_info: None,
            extra: LogContext::new(),
        }
    }

    /// Set the call site. `module` is derived from the file stem.
    pub fn with_location(mut self, file: &str, line: u32, function: &str) -> Self {
        self.module = Path::new(file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file)
            .to_string();
        self.pathname = file.to_string();
        self.line = line;
        self.function = function.to_string();
        self
    }

    pub fn with_args(mut self, args: Vec<FieldValue>) -> Self {
        self.args = args;
        self
    }

    pub fn with_extra(mut self, extra: LogContext) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_exception(mut self, exc_info: ExceptionInfo) -> Self {
        self.exc_info = Some(exc_info);
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// The interpolated message: `msg` with each `{}` replaced by the next arg.
    pub fn message(&self) -> String {
        if self.args.is_empty() {
            return self.msg.clone();
        }

        let mut out = String::with_capacity(self.msg.len() + 16 * self.args.len());
        let mut args = self.args.iter();
        let mut rest = self.msg.as_str();
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => {
                    let _ = write!(out, "{}", arg);
                }
                None => out.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }

    /// Creation time as fractional seconds since the Unix epoch
    pub fn created_epoch(&self) -> f64 {
        self.created.timestamp() as f64 + f64::from(self.created.timestamp_subsec_nanos()) / 1e9
    }

    /// Millisecond part of the creation time
    pub fn msecs(&self) -> u32 {
        self.created.timestamp_subsec_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct ValueError(String);

    impl std::fmt::Display for ValueError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for ValueError {}

    #[test]
    fn test_message_interpolation() {
        let record = LogRecord::new("etl", LogLevel::Info, "loaded {} rows into {}")
            .with_args(vec![42.into(), "bronze".into()]);
        assert_eq!(record.message(), "loaded 42 rows into bronze");
        assert_eq!(record.msg, "loaded {} rows into {}");
    }

    #[test]
    fn test_message_with_missing_args_keeps_placeholder() {
        let record = LogRecord::new("etl", LogLevel::Info, "{} and {}").with_args(vec![1.into()]);
        assert_eq!(record.message(), "1 and {}");
    }

    #[test]
    fn test_location_derives_module() {
        let record = LogRecord::new("etl", LogLevel::Info, "x").with_location(
            "src/jobs/bronze_ingest.rs",
            17,
            "run",
        );
        assert_eq!(record.module, "bronze_ingest");
        assert_eq!(record.line, 17);
        assert_eq!(record.function, "run");
    }

    #[test]
    fn test_exception_info_from_error() {
        let info = ExceptionInfo::from_error(&ValueError("bad".into()));
        assert_eq!(info.type_name, "ValueError");
        assert_eq!(info.message, "bad");
        assert!(info.traceback.starts_with("ValueError: bad"));
    }

    #[test]
    fn test_exception_info_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err = crate::core::LoggerError::io_operation("reading input", "open failed", io);
        let info = ExceptionInfo::from_error(&err);
        assert_eq!(info.type_name, "LoggerError");
        assert!(info.traceback.contains("Caused by: missing.csv"));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::ValueError"), "ValueError");
        assert_eq!(short_type_name("alloc::boxed::Box<dyn core::error::Error>"), "Box");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_created_epoch_has_fraction() {
        let created = DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        let record = LogRecord::new("etl", LogLevel::Info, "x").with_created(created);
        assert!((record.created_epoch() - 1_700_000_000.25).abs() < 1e-6);
        assert_eq!(record.msecs(), 250);
    }
}
