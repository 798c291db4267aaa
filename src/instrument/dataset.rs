//! Summary logging for tabular datasets
//!
//! The toolkit does not depend on any dataframe library. A dataset type
//! implements [`TabularSource`] and [`log_dataset_info`] turns the answers
//! into log lines. A probe that fails is logged at ERROR and the report
//! moves on to the next one.

use crate::core::{LogLevel, Logger};
use std::fmt::Display;

/// Read-only view of a table that can describe itself
pub trait TabularSource {
    type Error: Display;

    fn row_count(&self) -> Result<u64, Self::Error>;

    /// Printable schema, one column per line
    fn schema_description(&self) -> Result<String, Self::Error>;

    /// Printable rendering of the first `rows` rows
    fn sample(&self, rows: usize) -> Result<String, Self::Error>;

    /// Summary statistics of the numeric columns, `None` when there are none
    fn column_statistics(&self) -> Result<Option<String>, Self::Error>;
}

/// What [`log_dataset_info`] reports and at which level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReportOptions {
    /// Prefix of every line, in brackets
    pub name: String,
    pub show_schema: bool,
    pub show_sample: bool,
    pub sample_rows: usize,
    pub level: LogLevel,
}

impl Default for DatasetReportOptions {
    fn default() -> Self {
        Self {
            name: "DataFrame".to_string(),
            show_schema: true,
            show_sample: false,
            sample_rows: 5,
            level: LogLevel::Info,
        }
    }
}

impl DatasetReportOptions {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_schema(mut self, show: bool) -> Self {
        self.show_schema = show;
        self
    }

    #[must_use]
    pub fn with_sample(mut self, rows: usize) -> Self {
        self.show_sample = true;
        self.sample_rows = rows;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

/// Log row count, schema, sample and statistics of a dataset.
///
/// A missing dataset logs a single warning.
pub fn log_dataset_info<S: TabularSource + ?Sized>(
    source: Option<&S>,
    logger: &Logger,
    options: &DatasetReportOptions,
) {
    let name = &options.name;
    let Some(source) = source else {
        logger.warning(format!("[{}] Dataset is missing.", name));
        return;
    };

    match source.row_count() {
        Ok(rows) => logger.log(options.level, format!("[{}] Row count: {}", name, rows)),
        Err(e) => logger.error(format!("[{}] Error counting rows: {}", name, e)),
    }

    if options.show_schema {
        match source.schema_description() {
            Ok(schema) => logger.log(options.level, format!("[{}] Schema:\n{}", name, schema)),
            Err(e) => logger.error(format!("[{}] Error showing schema: {}", name, e)),
        }
    }

    if options.show_sample {
        match source.sample(options.sample_rows) {
            Ok(sample) => logger.log(
                options.level,
                format!("[{}] Sample ({} rows):\n{}", name, options.sample_rows, sample),
            ),
            Err(e) => logger.error(format!("[{}] Error showing sample: {}", name, e)),
        }
    }

    match source.column_statistics() {
        Ok(Some(stats)) => logger.log(options.level, format!("[{}] Statistics:\n{}", name, stats)),
        Ok(None) => {}
        Err(e) => logger.error(format!("[{}] Error computing statistics: {}", name, e)),
    }
}
