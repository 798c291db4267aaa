//! Named counters, values and timers for a pipeline run
//!
//! [`LogMetrics`] accumulates figures while a job runs and reports them
//! through a logger, one at a time or as a summary block.

use crate::core::{FieldValue, LogLevel, Logger};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::time::{Duration, Instant};

const SUMMARY_HEADER: &str = "--- Pipeline Metrics ---";
const SUMMARY_FOOTER: &str = "------------------------";

#[derive(Debug, Clone, Copy)]
struct TimerState {
    start: Instant,
    elapsed: Option<Duration>,
}

impl TimerState {
    fn seconds(&self) -> f64 {
        self.elapsed
            .unwrap_or_else(|| self.start.elapsed())
            .as_secs_f64()
    }
}

/// Point-in-time copy of every metric
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, i64>,
    pub values: BTreeMap<String, FieldValue>,
    /// Seconds, for stopped timers
    pub completed_timers: BTreeMap<String, f64>,
    /// Seconds so far, for running timers
    pub active_timers: BTreeMap<String, f64>,
}

/// Metric collector bound to one logger
///
/// Names are reported in sorted order.
///
/// ```
/// use pipeline_log_toolkit::instrument::LogMetrics;
/// use pipeline_log_toolkit::Logger;
///
/// let mut metrics = LogMetrics::new(&Logger::new("etl"));
/// metrics.increment("rows_read");
/// metrics.increment_by("rows_read", 99);
/// metrics.set("source", "orders.csv");
/// metrics.start("load");
/// let seconds = metrics.stop("load");
///
/// assert_eq!(metrics.counter("rows_read"), Some(100));
/// assert!(seconds >= 0.0);
/// metrics.log_all();
/// ```
#[derive(Debug)]
pub struct LogMetrics {
    logger: Logger,
    level: LogLevel,
    counters: BTreeMap<String, i64>,
    values: BTreeMap<String, FieldValue>,
    timers: BTreeMap<String, TimerState>,
}

impl LogMetrics {
    /// Collector reporting at INFO
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.clone(),
            level: LogLevel::Info,
            counters: BTreeMap::new(),
            values: BTreeMap::new(),
            timers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Add one to a counter, creating it at zero first
    pub fn increment(&mut self, name: &str) -> i64 {
        self.increment_by(name, 1)
    }

    /// Add `by` (which may be negative) to a counter
    pub fn increment_by(&mut self, name: &str, by: i64) -> i64 {
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter = counter.saturating_add(by);
        *counter
    }

    /// Set a value, replacing any previous one
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Start (or restart) a timer
    pub fn start(&mut self, name: &str) {
        self.timers.insert(
            name.to_string(),
            TimerState {
                start: Instant::now(),
                elapsed: None,
            },
        );
    }

    /// Stop a timer and return its elapsed seconds.
    ///
    /// An unknown timer returns `0.0` and is not created. Stopping again
    /// measures again from the same start.
    pub fn stop(&mut self, name: &str) -> f64 {
        match self.timers.get_mut(name) {
            Some(state) => {
                let elapsed = state.start.elapsed();
                state.elapsed = Some(elapsed);
                elapsed.as_secs_f64()
            }
            None => 0.0,
        }
    }

    pub fn counter(&self, name: &str) -> Option<i64> {
        self.counters.get(name).copied()
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Elapsed seconds of a timer, running or stopped
    pub fn elapsed(&self, name: &str) -> Option<f64> {
        self.timers.get(name).map(TimerState::seconds)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.timers
            .get(name)
            .is_some_and(|state| state.elapsed.is_none())
    }

    /// Log one metric.
    ///
    /// A counter takes precedence over a value of the same name, and a value
    /// over a stopped timer. Nothing is logged for an unknown name or a timer
    /// still running.
    pub fn log(&self, name: &str) {
        if let Some(count) = self.counters.get(name) {
            self.emit(format!("Counter '{}': {}", name, count));
        } else if let Some(value) = self.values.get(name) {
            self.emit(format!("Value '{}': {}", name, value));
        } else if let Some(elapsed) = self.timers.get(name).and_then(|state| state.elapsed) {
            self.emit(format!("Timer '{}': {:.2} seconds", name, elapsed.as_secs_f64()));
        }
    }

    /// Log an ad-hoc value without storing it
    pub fn log_value(&self, name: &str, value: impl Display) {
        self.emit(format!("Metric '{}': {}", name, value));
    }

    /// Log every metric as a summary block.
    ///
    /// Sections with no entries are left out; header and footer are always
    /// written.
    pub fn log_all(&self) {
        self.emit(SUMMARY_HEADER.to_string());

        if !self.counters.is_empty() {
            self.emit("Counters:".to_string());
            for (name, count) in &self.counters {
                self.emit(format!("  - {}: {}", name, count));
            }
        }

        if !self.values.is_empty() {
            self.emit("Values:".to_string());
            for (name, value) in &self.values {
                self.emit(format!("  - {}: {}", name, value));
            }
        }

        let (completed, active): (Vec<_>, Vec<_>) = self
            .timers
            .iter()
            .partition(|(_, state)| state.elapsed.is_some());

        if !completed.is_empty() {
            self.emit("Completed timers:".to_string());
            for (name, state) in completed {
                self.emit(format!("  - {}: {:.2} seconds", name, state.seconds()));
            }
        }

        if !active.is_empty() {
            self.emit("Active timers:".to_string());
            for (name, state) in active {
                self.emit(format!("  - {}: {:.2} seconds (running)", name, state.seconds()));
            }
        }

        self.emit(SUMMARY_FOOTER.to_string());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot {
            counters: self.counters.clone(),
            values: self.values.clone(),
            ..MetricsSnapshot::default()
        };
        for (name, state) in &self.timers {
            let target = if state.elapsed.is_some() {
                &mut snapshot.completed_timers
            } else {
                &mut snapshot.active_timers
            };
            target.insert(name.clone(), state.seconds());
        }
        snapshot
    }

    /// Drop every counter, value and timer
    pub fn reset(&mut self) {
        self.counters.clear();
        self.values.clear();
        self.timers.clear();
    }

    fn emit(&self, message: String) {
        self.logger.log(self.level, message);
    }
}
