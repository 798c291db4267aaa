//! Text formatter with ANSI level colors

use super::palette::ColorPalette;
use super::text::TextFormatter;
use super::{Formatter, FormatterConfig};
use crate::core::{LogLevel, LogRecord, Result, TimeConverter};

/// Colored text formatter
///
/// The level name is always wrapped in its level color; the message is wrapped
/// too for ERROR and CRITICAL. The record is restored before `format` returns.
#[derive(Debug, Clone)]
pub struct ColoredFormatter {
    inner: TextFormatter,
    use_colors: bool,
}

/// Puts `level_name` and `msg` back when dropped, so the record is restored
/// on every exit path.
struct RestoreFields<'a> {
    record: &'a mut LogRecord,
    level_name: Option<String>,
    msg: Option<String>,
}

impl Drop for RestoreFields<'_> {
    fn drop(&mut self) {
        if let Some(level_name) = self.level_name.take() {
            self.record.level_name = level_name;
        }
        if let Some(msg) = self.msg.take() {
            self.record.msg = msg;
        }
    }
}

impl ColoredFormatter {
    /// # Errors
    ///
    /// Fails like [`TextFormatter::new`] on a malformed template.
    pub fn new(config: FormatterConfig, use_colors: bool) -> Result<Self> {
        Ok(Self {
            inner: TextFormatter::new(config)?,
            use_colors,
        })
    }

    #[must_use]
    pub fn with_converter(mut self, converter: TimeConverter) -> Self {
        self.inner.set_converter(converter);
        self
    }

    pub fn set_converter(&mut self, converter: TimeConverter) {
        self.inner.set_converter(converter);
    }

    pub fn use_colors(&self) -> bool {
        self.use_colors
    }

    pub fn text(&self) -> &TextFormatter {
        &self.inner
    }
}

impl Formatter for ColoredFormatter {
    fn format(&self, record: &mut LogRecord) -> String {
        if !self.use_colors {
            return self.inner.render(record);
        }

        let color = ColorPalette::for_level(record.level);
        let colored_level = format!("{}{}{}", color, record.level_name, ColorPalette::RESET);
        let colored_msg = (record.level >= LogLevel::Error)
            .then(|| format!("{}{}{}", color, record.msg, ColorPalette::RESET));

        let mut guard = RestoreFields {
            level_name: Some(std::mem::replace(&mut record.level_name, colored_level)),
            msg: None,
            record,
        };
        if let Some(colored_msg) = colored_msg {
            guard.msg = Some(std::mem::replace(&mut guard.record.msg, colored_msg));
        }

        self.inner.render(&*guard.record)
    }
}
