//! JSON formatter for structured logging
//!
//! Each record becomes a single-line JSON object (JSONL), ready for log
//! aggregation tools. Keys are emitted in sorted order.

use super::Formatter;
use crate::core::timestamp::{render_time, validate_strftime};
use crate::core::{LogRecord, Result, TimeConverter};
use serde_json::{json, Map, Value};

/// Extra-field names that are never copied into the output object.
///
/// Covers the standard record attributes and the formatter's own fixed keys,
/// so an extra can never overwrite `level`, `message` and so on.
pub const RESERVED_ATTRS: &[&str] = &[
    "args",
    "asctime",
    "created",
    "exc_info",
    "exc_text",
    "exception",
    "filename",
    "funcName",
    "function",
    "id",
    "level",
    "levelname",
    "levelno",
    "line",
    "lineno",
    "message",
    "module",
    "msecs",
    "msg",
    "name",
    "pathname",
    "process",
    "processName",
    "relativeCreated",
    "stack_info",
    "thread",
    "threadName",
    "timestamp",
];

/// JSON formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    date_format: Option<String>,
    converter: TimeConverter,
}

impl JsonFormatter {
    /// Formatter with the built-in `YYYY-MM-DD HH:MM:SS,mmm` timestamp
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`crate::LoggerError::InvalidConfiguration`] for a malformed
    /// strftime pattern.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Result<Self> {
        let date_format = date_format.into();
        validate_strftime(&date_format)?;
        self.date_format = Some(date_format);
        Ok(self)
    }

    #[must_use]
    pub fn with_converter(mut self, converter: TimeConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn set_converter(&mut self, converter: TimeConverter) {
        self.converter = converter;
    }

    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    /// Build the output object without serializing it
    pub fn to_value(&self, record: &LogRecord) -> Value {
        let time = self.converter.convert(record.created_epoch());
        let timestamp = render_time(&time, self.date_format.as_deref(), record.msecs());

        let mut object = Map::new();
        object.insert("timestamp".into(), Value::String(timestamp));
        object.insert("level".into(), Value::String(record.level_name.clone()));
        object.insert("name".into(), Value::String(record.name.clone()));
        object.insert("message".into(), Value::String(record.message()));
        object.insert("module".into(), Value::String(record.module.clone()));
        object.insert("function".into(), Value::String(record.function.clone()));
        object.insert("line".into(), Value::from(record.line));

        if let Some(ref exc) = record.exc_info {
            object.insert(
                "exception".into(),
                json!({
                    "type": exc.type_name,
                    "message": exc.message,
                    "traceback": exc.traceback,
                }),
            );
        }

        for (key, value) in record.extra.fields() {
            if !RESERVED_ATTRS.contains(&key.as_str()) {
                object.insert(key.clone(), value.to_json_value());
            }
        }

        Value::Object(object)
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &mut LogRecord) -> String {
        self.to_value(record).to_string()
    }
}
