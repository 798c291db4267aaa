//! Template-driven text formatter
//!
//! Templates are parsed once into literal and placeholder segments. Three
//! placeholder syntaxes are understood (see [`FormatStyle`]):
//!
//! ```text
//! %(asctime)s [%(levelname)-8s] %(name)s - %(message)s
//! {asctime} [{levelname:<8}] {name} - {message}
//! $asctime [${levelname}] $name - $message
//! ```
//!
//! Known field names map to record attributes; anything else is looked up in
//! the record's extra fields and left verbatim if absent.

use super::{FormatStyle, Formatter, FormatterConfig};
use crate::core::timestamp::{render_time, validate_strftime};
use crate::core::{LogRecord, LoggerError, Result, TimeConverter};
use std::borrow::Cow;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    name: String,
    width: Option<usize>,
    align: Align,
    /// Original template text, emitted when the field cannot be resolved
    raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

/// Plain text formatter
#[derive(Debug, Clone)]
pub struct TextFormatter {
    config: FormatterConfig,
    segments: Vec<Segment>,
    uses_time: bool,
    converter: TimeConverter,
}

impl TextFormatter {
    /// Build a formatter, validating the template and date pattern.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for a malformed template
    /// or strftime pattern.
    pub fn new(config: FormatterConfig) -> Result<Self> {
        if let Some(ref pattern) = config.date_format {
            validate_strftime(pattern)?;
        }
        let segments = parse_template(&config.format, config.style)?;
        let uses_time = segments
            .iter()
            .any(|s| matches!(s, Segment::Field(p) if p.name == "asctime"));

        Ok(Self {
            config,
            segments,
            uses_time,
            converter: TimeConverter::default(),
        })
    }

    /// Replace the time-conversion hook
    #[must_use]
    pub fn with_converter(mut self, converter: TimeConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn set_converter(&mut self, converter: TimeConverter) {
        self.converter = converter;
    }

    pub fn converter(&self) -> &TimeConverter {
        &self.converter
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Whether the template references `asctime`
    pub fn uses_time(&self) -> bool {
        self.uses_time
    }

    /// Render the record's creation time through the conversion hook
    pub fn format_time(&self, record: &LogRecord) -> String {
        let time = self.converter.convert(record.created_epoch());
        render_time(&time, self.config.date_format.as_deref(), record.msecs())
    }

    /// Render without touching the record
    pub fn render(&self, record: &LogRecord) -> String {
        let message = record.message();
        let asctime = if self.uses_time {
            self.format_time(record)
        } else {
            String::new()
        };

        let mut out = String::with_capacity(message.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(placeholder) => {
                    match resolve_field(record, &placeholder.name, &message, &asctime) {
                        Some(value) => pad_into(&mut out, &value, placeholder),
                        None => out.push_str(&placeholder.raw),
                    }
                }
            }
        }

        if let Some(ref exc) = record.exc_info {
            out.push('\n');
            out.push_str(&exc.traceback);
        }
        out
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        let config = FormatterConfig::default();
        let segments = parse_template(&config.format, config.style).unwrap_or_default();
        Self {
            config,
            segments,
            uses_time: true,
            converter: TimeConverter::default(),
        }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &mut LogRecord) -> String {
        self.render(record)
    }
}

fn resolve_field<'a>(
    record: &'a LogRecord,
    name: &str,
    message: &'a str,
    asctime: &'a str,
) -> Option<Cow<'a, str>> {
    let value = match name {
        "asctime" => Cow::Borrowed(asctime),
        "message" => Cow::Borrowed(message),
        "msg" => Cow::Borrowed(record.msg.as_str()),
        "levelname" => Cow::Borrowed(record.level_name.as_str()),
        "levelno" => Cow::Owned(record.level.levelno().to_string()),
        "name" => Cow::Borrowed(record.name.as_str()),
        "module" => Cow::Borrowed(record.module.as_str()),
        "funcName" => Cow::Borrowed(record.function.as_str()),
        "lineno" => Cow::Owned(record.line.to_string()),
        "pathname" => Cow::Borrowed(record.pathname.as_str()),
        "filename" => Cow::Borrowed(
            Path::new(&record.pathname)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(record.pathname.as_str()),
        ),
        "created" => Cow::Owned(format!("{:.6}", record.created_epoch())),
        "msecs" => Cow::Owned(format!("{:03}", record.msecs())),
        "thread" => Cow::Borrowed(record.thread_id.as_str()),
        "threadName" => Cow::Borrowed(
            record
                .thread_name
                .as_deref()
                .unwrap_or(record.thread_id.as_str()),
        ),
        "process" => Cow::Owned(record.process.to_string()),
        other => Cow::Owned(record.extra.get(other)?.to_string()),
    };
    Some(value)
}

fn pad_into(out: &mut String, value: &str, placeholder: &Placeholder) {
    let len = value.chars().count();
    let fill = placeholder.width.map_or(0, |w| w.saturating_sub(len));
    let (before, after) = match placeholder.align {
        Align::Left => (0, fill),
        Align::Right => (fill, 0),
        Align::Center => (fill / 2, fill - fill / 2),
    };
    out.extend(std::iter::repeat(' ').take(before));
    out.push_str(value);
    out.extend(std::iter::repeat(' ').take(after));
}

fn template_error(message: impl Into<String>) -> LoggerError {
    LoggerError::config("log format", message)
}

fn parse_template(template: &str, style: FormatStyle) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let chars: Vec<char> = template.chars().collect();
    let mut i = 0;

    let mut flush = |literal: &mut String, segments: &mut Vec<Segment>| {
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(literal)));
        }
    };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match (style, c) {
            (FormatStyle::Percent, '%') => match next {
                Some('%') => {
                    literal.push('%');
                    i += 2;
                }
                Some('(') => {
                    let (placeholder, end) = parse_percent(&chars, i)?;
                    flush(&mut literal, &mut segments);
                    segments.push(Segment::Field(placeholder));
                    i = end;
                }
                _ => {
                    literal.push('%');
                    i += 1;
                }
            },
            (FormatStyle::Brace, '{') => {
                if next == Some('{') {
                    literal.push('{');
                    i += 2;
                } else {
                    let (placeholder, end) = parse_brace(&chars, i)?;
                    flush(&mut literal, &mut segments);
                    segments.push(Segment::Field(placeholder));
                    i = end;
                }
            }
            (FormatStyle::Brace, '}') if next == Some('}') => {
                literal.push('}');
                i += 2;
            }
            (FormatStyle::Dollar, '$') => match next {
                Some('$') => {
                    literal.push('$');
                    i += 2;
                }
                Some('{') => {
                    let close = find_from(&chars, i + 2, '}').ok_or_else(|| {
                        template_error(format!("unterminated '${{' at offset {}", i))
                    })?;
                    let name: String = chars[i + 2..close].iter().collect();
                    if name.is_empty() {
                        return Err(template_error("empty placeholder '${}'"));
                    }
                    flush(&mut literal, &mut segments);
                    segments.push(Segment::Field(Placeholder {
                        raw: chars[i..=close].iter().collect(),
                        name,
                        width: None,
                        align: Align::Left,
                    }));
                    i = close + 1;
                }
                Some(n) if n.is_ascii_alphabetic() || n == '_' => {
                    let mut end = i + 1;
                    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                        end += 1;
                    }
                    flush(&mut literal, &mut segments);
                    segments.push(Segment::Field(Placeholder {
                        name: chars[i + 1..end].iter().collect(),
                        raw: chars[i..end].iter().collect(),
                        width: None,
                        align: Align::Left,
                    }));
                    i = end;
                }
                _ => {
                    literal.push('$');
                    i += 1;
                }
            },
            _ => {
                literal.push(c);
                i += 1;
            }
        }
    }
    flush(&mut literal, &mut segments);
    Ok(segments)
}

fn find_from(chars: &[char], start: usize, target: char) -> Option<usize> {
    chars
        .iter()
        .skip(start)
        .position(|&c| c == target)
        .map(|p| p + start)
}

/// Parse `%(name)[-][width][.precision]conv` starting at the `%`
fn parse_percent(chars: &[char], start: usize) -> Result<(Placeholder, usize)> {
    let close = find_from(chars, start + 2, ')')
        .ok_or_else(|| template_error(format!("unterminated '%(' at offset {}", start)))?;
    let name: String = chars[start + 2..close].iter().collect();
    if name.is_empty() {
        return Err(template_error("empty placeholder '%()'"));
    }

    let mut i = close + 1;
    let mut align = Align::Right;
    if chars.get(i) == Some(&'-') {
        align = Align::Left;
        i += 1;
    }
    let width = read_number(chars, &mut i);
    if chars.get(i) == Some(&'.') {
        i += 1;
        read_number(chars, &mut i);
    }

    match chars.get(i) {
        Some('s' | 'd' | 'i' | 'f' | 'r') => {}
        Some(other) => {
            return Err(template_error(format!(
                "unsupported conversion '{}' for field '{}'",
                other, name
            )))
        }
        None => {
            return Err(template_error(format!(
                "missing conversion for field '{}'",
                name
            )))
        }
    }

    let end = i + 1;
    let placeholder = Placeholder {
        raw: chars[start..end].iter().collect(),
        name,
        width,
        align: if width.is_some() { align } else { Align::Left },
    };
    Ok((placeholder, end))
}

/// Parse `{name[:[align]width]}` starting at the `{`
fn parse_brace(chars: &[char], start: usize) -> Result<(Placeholder, usize)> {
    let close = find_from(chars, start + 1, '}')
        .ok_or_else(|| template_error(format!("unterminated '{{' at offset {}", start)))?;
    let body: String = chars[start + 1..close].iter().collect();
    let (name, spec) = match body.split_once(':') {
        Some((name, spec)) => (name.to_string(), spec),
        None => (body.clone(), ""),
    };
    if name.is_empty() {
        return Err(template_error("empty placeholder '{}'"));
    }

    let spec: Vec<char> = spec.chars().collect();
    let mut i = 0;
    let align = match spec.first() {
        Some('<') => {
            i = 1;
            Align::Left
        }
        Some('>') => {
            i = 1;
            Align::Right
        }
        Some('^') => {
            i = 1;
            Align::Center
        }
        _ => Align::Left,
    };
    let width = read_number(&spec, &mut i);
    if i != spec.len() {
        return Err(template_error(format!(
            "unsupported format spec in '{{{}}}'",
            body
        )));
    }

    let placeholder = Placeholder {
        raw: chars[start..=close].iter().collect(),
        name,
        width,
        align,
    };
    Ok((placeholder, close + 1))
}

fn read_number(chars: &[char], i: &mut usize) -> Option<usize> {
    let start = *i;
    while *i < chars.len() && chars[*i].is_ascii_digit() {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    chars[start..*i].iter().collect::<String>().parse().ok()
}
