//! ANSI escape sequences used by the colored formatter

use crate::core::LogLevel;
use colored::Color;
use std::sync::OnceLock;

/// Terminal escape table
pub struct ColorPalette;

impl ColorPalette {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const UNDERLINE: &'static str = "\x1b[4m";

    /// Foreground escape for `color`
    pub fn fg(color: Color) -> String {
        format!("\x1b[{}m", color.to_fg_str())
    }

    /// Background escape for `color`
    pub fn bg(color: Color) -> String {
        format!("\x1b[{}m", color.to_bg_str())
    }

    /// Escape prefix for a level.
    ///
    /// DEBUG cyan, INFO green, WARNING yellow, ERROR red, CRITICAL bold white
    /// on red. Any other level gets [`ColorPalette::RESET`], i.e. no color.
    pub fn for_level(level: LogLevel) -> &'static str {
        static TABLE: OnceLock<[String; 5]> = OnceLock::new();
        let table = TABLE.get_or_init(|| {
            [
                Self::fg(Color::Cyan),
                Self::fg(Color::Green),
                Self::fg(Color::Yellow),
                Self::fg(Color::Red),
                format!("{}{}{}", Self::bg(Color::Red), Self::fg(Color::White), Self::BOLD),
            ]
        });

        match level {
            LogLevel::Debug => &table[0],
            LogLevel::Info => &table[1],
            LogLevel::Warning => &table[2],
            LogLevel::Error => &table[3],
            LogLevel::Critical => &table[4],
            LogLevel::Trace => Self::RESET,
        }
    }

    /// Remove every `ESC [ ... m` sequence from `text`
    pub fn strip(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\x1b' && chars.peek() == Some(&'[') {
                for next in chars.by_ref() {
                    if next == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }
}
