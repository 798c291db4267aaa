//! Time conversion for rendered timestamps
//!
//! A [`TimeConverter`] turns a record's epoch time into broken-down wall-clock
//! time. Formatters hold one as their conversion hook, so the rendered
//! timestamp reflects a named zone no matter where the process runs.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Default timestamp pattern for text output
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Pattern for the timestamp embedded in session file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H:%M:%S";

type ConvertFn = dyn Fn(f64) -> NaiveDateTime + Send + Sync;

/// Pure function `epoch seconds -> local broken-down time`
#[derive(Clone)]
pub struct TimeConverter {
    label: String,
    convert: Arc<ConvertFn>,
}

impl TimeConverter {
    /// Wrap an arbitrary conversion function
    pub fn from_fn<F>(label: impl Into<String>, convert: F) -> Self
    where
        F: Fn(f64) -> NaiveDateTime + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            convert: Arc::new(convert),
        }
    }

    /// Host local time (the default hook)
    pub fn local() -> Self {
        Self::from_fn("local", |epoch| {
            epoch_to_utc(epoch).with_timezone(&Local).naive_local()
        })
    }

    pub fn utc() -> Self {
        Self::from_fn("UTC", |epoch| epoch_to_utc(epoch).naive_utc())
    }

    /// Converter for a named IANA zone such as `America/Sao_Paulo`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::UnknownTimezone`] if the name does not resolve.
    pub fn for_timezone(tz_name: &str) -> Result<Self> {
        let tz: Tz = tz_name
            .parse()
            .map_err(|_| LoggerError::unknown_timezone(tz_name))?;
        Ok(Self::from_fn(tz.name(), move |epoch| {
            epoch_to_utc(epoch).with_timezone(&tz).naive_local()
        }))
    }

    #[inline]
    pub fn convert(&self, epoch: f64) -> NaiveDateTime {
        (self.convert)(epoch)
    }

    /// Current wall-clock time in this converter's zone
    pub fn now(&self) -> NaiveDateTime {
        self.convert(utc_to_epoch(&Utc::now()))
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for TimeConverter {
    fn default() -> Self {
        Self::local()
    }
}

impl fmt::Debug for TimeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeConverter")
            .field("label", &self.label)
            .finish()
    }
}

/// Build the conversion hook for `tz_name`.
///
/// # Errors
///
/// Returns [`LoggerError::UnknownTimezone`] if the name does not resolve.
pub fn make_timezone_converter(tz_name: &str) -> Result<TimeConverter> {
    TimeConverter::for_timezone(tz_name)
}

pub(crate) fn epoch_to_utc(epoch: f64) -> DateTime<Utc> {
    let secs = epoch.floor();
    let nanos = ((epoch - secs) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos).unwrap_or_default()
}

pub(crate) fn utc_to_epoch(datetime: &DateTime<Utc>) -> f64 {
    datetime.timestamp() as f64 + f64::from(datetime.timestamp_subsec_nanos()) / 1e9
}

/// Reject strftime patterns chrono cannot render.
///
/// chrono panics when a malformed pattern is displayed, so patterns are
/// checked once when a formatter is built.
pub fn validate_strftime(pattern: &str) -> Result<()> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(LoggerError::config(
            "date format",
            format!("invalid strftime pattern '{}'", pattern),
        ));
    }
    Ok(())
}

/// Render a broken-down time.
///
/// Without a pattern the output is `YYYY-MM-DD HH:MM:SS,mmm`.
pub fn render_time(time: &NaiveDateTime, date_format: Option<&str>, msecs: u32) -> String {
    let mut out = String::with_capacity(32);
    match date_format {
        Some(pattern) => {
            let _ = write!(out, "{}", time.format(pattern));
        }
        None => {
            let _ = write!(out, "{},{:03}", time.format(DEFAULT_DATE_FORMAT), msecs);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_epoch() -> f64 {
        // 2025-01-08 10:30:45.123 UTC
        let dt = Utc
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123);
        utc_to_epoch(&dt)
    }

    #[test]
    fn test_utc_converter() {
        let converter = TimeConverter::utc();
        let time = converter.convert(fixed_epoch());
        assert_eq!(time.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-01-08 10:30:45");
    }

    #[test]
    fn test_named_timezone_shifts_wall_clock() {
        // Sao Paulo has no DST since 2019: UTC-3 all year
        let converter = make_timezone_converter("America/Sao_Paulo").unwrap();
        let time = converter.convert(fixed_epoch());
        assert_eq!(time.format("%H:%M").to_string(), "07:30");
        assert_eq!(converter.label(), "America/Sao_Paulo");

        let tokyo = make_timezone_converter("Asia/Tokyo").unwrap();
        assert_eq!(tokyo.convert(fixed_epoch()).format("%H:%M").to_string(), "19:30");
    }

    #[test]
    fn test_unknown_timezone() {
        let err = make_timezone_converter("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, LoggerError::UnknownTimezone { ref name } if name == "Mars/Olympus_Mons"));
    }

    #[test]
    fn test_render_default_pattern_has_millis() {
        let time = TimeConverter::utc().convert(fixed_epoch());
        assert_eq!(render_time(&time, None, 123), "2025-01-08 10:30:45,123");
        assert_eq!(
            render_time(&time, Some(FILE_TIMESTAMP_FORMAT), 0),
            "20250108_10:30:45"
        );
    }

    #[test]
    fn test_validate_strftime() {
        assert!(validate_strftime(DEFAULT_DATE_FORMAT).is_ok());
        assert!(validate_strftime("%Y-%Q").is_err());
    }

    #[test]
    fn test_epoch_roundtrip_fraction() {
        let dt = epoch_to_utc(1_700_000_000.5);
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(dt.timestamp_subsec_millis(), 500);
    }
}
