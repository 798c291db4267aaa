//! Record formatters
//!
//! A formatter renders one [`LogRecord`] to a string. Three are provided:
//! - [`TextFormatter`]: template-driven plain text
//! - [`ColoredFormatter`]: text with ANSI level colors
//! - [`JsonFormatter`]: one JSON object per record

pub mod colorized;
pub mod json;
pub mod palette;
pub mod text;

pub use colorized::ColoredFormatter;
pub use json::{JsonFormatter, RESERVED_ATTRS};
pub use palette::ColorPalette;
pub use text::TextFormatter;

use crate::core::{LogRecord, DEFAULT_DATE_FORMAT};
use serde::{Deserialize, Serialize};

/// Default text template
pub const DEFAULT_LOG_FORMAT: &str = "%(asctime)s [%(levelname)s] %(name)s - %(message)s";

/// Renders a record.
///
/// `format` takes the record mutably so a formatter may rewrite display
/// fields while rendering. Every implementation must hand the record back
/// unchanged: the same instance goes on to the next handler.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &mut LogRecord) -> String;
}

/// Placeholder syntax of a text template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatStyle {
    /// `%(levelname)s`
    #[default]
    #[serde(rename = "%")]
    Percent,
    /// `{levelname}`
    #[serde(rename = "{")]
    Brace,
    /// `$levelname` or `${levelname}`
    #[serde(rename = "$")]
    Dollar,
}

impl FormatStyle {
    /// Parse the one-character style token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "%" => Some(FormatStyle::Percent),
            "{" => Some(FormatStyle::Brace),
            "$" => Some(FormatStyle::Dollar),
            _ => None,
        }
    }
}

/// Configuration for text formatting
///
/// # Examples
///
/// ```
/// use pipeline_log_toolkit::formatters::{FormatStyle, FormatterConfig};
///
/// let config = FormatterConfig::new()
///     .with_format("{asctime} | {levelname} | {message}")
///     .with_style(FormatStyle::Brace)
///     .with_date_format("%H:%M:%S");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    /// Record template
    pub format: String,
    /// strftime pattern for `asctime`; `None` renders `YYYY-MM-DD HH:MM:SS,mmm`
    pub date_format: Option<String>,
    /// Placeholder syntax of `format`
    pub style: FormatStyle,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
            date_format: Some(DEFAULT_DATE_FORMAT.to_string()),
            style: FormatStyle::Percent,
        }
    }
}

impl FormatterConfig {
    /// Create a new formatter configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = Some(date_format.into());
        self
    }

    /// Use the built-in `YYYY-MM-DD HH:MM:SS,mmm` timestamp
    #[must_use]
    pub fn without_date_format(mut self) -> Self {
        self.date_format = None;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: FormatStyle) -> Self {
        self.style = style;
        self
    }
}
