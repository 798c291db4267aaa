//! Instrumentation helpers built on [`Logger`](crate::Logger)
//!
//! - [`LogTimer`]: start/finish messages with elapsed time
//! - [`LogMetrics`]: counters, values and timers reported as a block
//! - [`log_dataset_info`]: summary lines for a [`TabularSource`]

pub mod dataset;
pub mod metrics;
pub mod timer;

pub use dataset::{log_dataset_info, DatasetReportOptions, TabularSource};
pub use metrics::{LogMetrics, MetricsSnapshot};
pub use timer::{LogTimer, TimerDecorator, TimerGuard};
