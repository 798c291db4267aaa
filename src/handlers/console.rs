//! Console handler implementation

use crate::core::{Handler, LogLevel, LoggerError, Result, SharedFormatter};
use crate::formatters::TextFormatter;
use std::io::{self, Write};
use std::sync::Arc;

/// Writes rendered records to standard output, one per line
pub struct ConsoleHandler {
    level: LogLevel,
    formatter: SharedFormatter,
    writer: Box<dyn Write + Send>,
    closed: bool,
}

impl ConsoleHandler {
    pub fn new(level: LogLevel, formatter: SharedFormatter) -> Self {
        Self::with_writer(level, formatter, Box::new(io::stdout()))
    }

    /// Console-style handler over an arbitrary stream
    pub fn with_writer(
        level: LogLevel,
        formatter: SharedFormatter,
        writer: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            level,
            formatter,
            writer,
            closed: false,
        }
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new(LogLevel::Trace, Arc::new(TextFormatter::default()))
    }
}

impl Handler for ConsoleHandler {
    fn name(&self) -> &str {
        "console"
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    fn formatter(&self) -> &SharedFormatter {
        &self.formatter
    }

    fn set_formatter(&mut self, formatter: SharedFormatter) {
        self.formatter = formatter;
    }

    fn emit(&mut self, rendered: &str) -> Result<()> {
        if self.closed {
            return Err(LoggerError::handler_closed(self.name()));
        }
        writeln!(self.writer, "{}", rendered)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// The process stream itself stays open; only this handler stops writing.
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.writer.flush()?;
            self.closed = true;
        }
        Ok(())
    }
}
