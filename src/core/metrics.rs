//! Logger health counters
//!
//! Tracks how many records a logger emitted, how many reached no handler at
//! all, and how many handler writes failed. These are about the logging
//! substrate itself; pipeline metrics live in [`crate::instrument::LogMetrics`].

use std::sync::atomic::{AtomicU64, Ordering};

/// Health counters for one logger
///
/// # Example
///
/// ```
/// use pipeline_log_toolkit::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_emitted();
/// metrics.record_handler_error();
///
/// assert_eq!(metrics.records_emitted(), 1);
/// assert_eq!(metrics.handler_errors(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records that passed the level check and were dispatched
    records_emitted: AtomicU64,

    /// Records that found no handler anywhere in the chain
    unhandled_records: AtomicU64,

    /// Handler emit/flush/close failures
    handler_errors: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            records_emitted: AtomicU64::new(0),
            unhandled_records: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_emitted(&self) -> u64 {
        self.records_emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn unhandled_records(&self) -> u64 {
        self.unhandled_records.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn handler_errors(&self) -> u64 {
        self.handler_errors.load(Ordering::Relaxed)
    }

    /// Record a dispatched record; returns the previous count
    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.records_emitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_unhandled(&self) -> u64 {
        self.unhandled_records.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_handler_error(&self) -> u64 {
        self.handler_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of emitted records that hit at least one handler failure (0.0 - 100.0)
    pub fn error_rate(&self) -> f64 {
        let emitted = self.records_emitted() as f64;
        if emitted == 0.0 {
            0.0
        } else {
            (self.handler_errors() as f64 / emitted) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.records_emitted.store(0, Ordering::Relaxed);
        self.unhandled_records.store(0, Ordering::Relaxed);
        self.handler_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            records_emitted: AtomicU64::new(self.records_emitted()),
            unhandled_records: AtomicU64::new(self.unhandled_records()),
            handler_errors: AtomicU64::new(self.handler_errors()),
        }
    }
}
