//! Elapsed-time instrumentation
//!
//! A [`LogTimer`] logs when an operation starts and how long it took. Use it
//! as a scope guard, around a closure, or as a wrapper that turns a function
//! into a timed one.
//!
//! ```
//! use pipeline_log_toolkit::instrument::LogTimer;
//! use pipeline_log_toolkit::Logger;
//!
//! let logger = Logger::new("etl");
//!
//! {
//!     let _timer = LogTimer::new(&logger, "load orders").enter();
//!     // ... work ...
//! } // "Completed: load orders in 0.00 seconds."
//!
//! let rows = LogTimer::new(&logger, "count").time(|| 42);
//! assert_eq!(rows, 42);
//! ```

use crate::core::{short_type_name, LogLevel, LogRecord, Logger};
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe, Location};
use std::time::{Duration, Instant};

/// An operation to be timed; not started until [`enter`](Self::enter)
#[derive(Debug, Clone)]
pub struct LogTimer {
    logger: Logger,
    operation: String,
    level: LogLevel,
}

impl LogTimer {
    /// Timer logging at INFO
    pub fn new(logger: &Logger, operation: impl Into<String>) -> Self {
        Self {
            logger: logger.clone(),
            operation: operation.into(),
            level: LogLevel::Info,
        }
    }

    /// Level of the start and completion messages. Failures always log at ERROR.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Start timing and log `Starting: {operation}`.
    ///
    /// The returned guard logs the outcome when dropped.
    #[track_caller]
    pub fn enter(self) -> TimerGuard {
        let guard = TimerGuard {
            logger: self.logger,
            operation: self.operation,
            level: self.level,
            location: Location::caller(),
            start: Instant::now(),
            finished: false,
        };
        guard.emit(guard.level, format!("Starting: {}", guard.operation));
        guard
    }

    /// Time a closure. A panic is logged and then resumed.
    #[track_caller]
    pub fn time<T, F: FnOnce() -> T>(self, f: F) -> T {
        let mut guard = self.enter();
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                guard.complete();
                value
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                guard.fail("panic", &message);
                panic::resume_unwind(payload)
            }
        }
    }

    /// Time a fallible closure; an `Err` is logged and returned unchanged.
    #[track_caller]
    pub fn time_result<T, E: Display, F: FnOnce() -> Result<T, E>>(self, f: F) -> Result<T, E> {
        let guard = self.enter();
        let result = f();
        guard.exit(result)
    }

    /// Build a decorator that times every call of the functions it wraps.
    ///
    /// Without an explicit operation name the wrapped function's name is used.
    pub fn as_decorator(logger: &Logger, operation: Option<&str>, level: LogLevel) -> TimerDecorator {
        TimerDecorator {
            logger: logger.clone(),
            operation: operation.map(str::to_string),
            level,
        }
    }
}

/// A running timer
#[must_use = "the timer logs completion when the guard is dropped"]
pub struct TimerGuard {
    logger: Logger,
    operation: String,
    level: LogLevel,
    location: &'static Location<'static>,
    start: Instant,
    finished: bool,
}

impl TimerGuard {
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Finish with the outcome of the timed block.
    ///
    /// An `Err` is logged at ERROR with its type name and message; the result
    /// is handed back untouched either way.
    pub fn exit<T, E: Display>(mut self, result: Result<T, E>) -> Result<T, E> {
        match &result {
            Ok(_) => self.complete(),
            Err(e) => {
                let type_name = short_type_name(std::any::type_name::<E>());
                self.fail(type_name, &e.to_string());
            }
        }
        result
    }

    /// Finish successfully
    pub fn finish(mut self) {
        self.complete();
    }

    fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let elapsed = self.elapsed().as_secs_f64();
        self.emit(
            self.level,
            format!("Completed: {} in {:.2} seconds.", self.operation, elapsed),
        );
    }

    fn fail(&mut self, type_name: &str, message: &str) {
        if self.finished {
            return;
        }
        self.finished = true;
        let elapsed = self.elapsed().as_secs_f64();
        self.emit(
            LogLevel::Error,
            format!(
                "Failed '{}' after {:.2} seconds. Error: {}: {}",
                self.operation, elapsed, type_name, message
            ),
        );
    }

    fn emit(&self, level: LogLevel, message: String) {
        let record = LogRecord::new(self.logger.name(), level, message).with_location(
            self.location.file(),
            self.location.line(),
            "",
        );
        self.logger.log_record(record);
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.fail("panic", "block unwound");
        } else {
            self.complete();
        }
    }
}

/// Wraps functions so each call runs under a fresh [`TimerGuard`]
#[derive(Debug, Clone)]
pub struct TimerDecorator {
    logger: Logger,
    operation: Option<String>,
    level: LogLevel,
}

impl TimerDecorator {
    fn timer_for<F>(&self) -> LogTimer {
        let operation = self
            .operation
            .clone()
            .unwrap_or_else(|| callable_name::<F>().to_string());
        LogTimer::new(&self.logger, operation).with_level(self.level)
    }

    /// Wrap a function without arguments
    pub fn wrap<R, F: Fn() -> R>(&self, f: F) -> impl Fn() -> R {
        let decorator = self.clone();
        move || decorator.timer_for::<F>().time(&f)
    }

    /// Wrap a function of one argument (use a tuple for several)
    pub fn wrap_with<A, R, F: Fn(A) -> R>(&self, f: F) -> impl Fn(A) -> R {
        let decorator = self.clone();
        move |arg| decorator.timer_for::<F>().time(|| f(arg))
    }

    /// Wrap a fallible function; an `Err` is logged and returned unchanged
    pub fn wrap_result<T, E: Display, F: Fn() -> Result<T, E>>(
        &self,
        f: F,
    ) -> impl Fn() -> Result<T, E> {
        let decorator = self.clone();
        move || decorator.timer_for::<F>().time_result(&f)
    }
}

/// Name of a function item, or of the function enclosing a closure
fn callable_name<F>() -> &'static str {
    let mut name = std::any::type_name::<F>();
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name.rsplit("::").next().unwrap_or(name)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
