//! Property-based tests for pipeline_log_toolkit using proptest

use pipeline_log_toolkit::formatters::{ColorPalette, RESERVED_ATTRS};
use pipeline_log_toolkit::handlers::RotatingFileHandler;
use pipeline_log_toolkit::prelude::*;
use pipeline_log_toolkit::SharedFormatter;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop::sample::select(LogLevel::ALL.to_vec())
}

// Printable text without escape sequences
fn plain_text() -> impl Strategy<Value = String> {
    "[ -~]{0,64}"
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Display output parses back to the same level
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_string().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Ordering agrees with the numeric ladder
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, a.levelno() <= b.levelno());
        prop_assert_eq!(a > b, a.levelno() > b.levelno());
    }

    /// Parsing ignores case
    #[test]
    fn test_log_level_case_insensitive(level in any_level(), lower in any::<bool>()) {
        let text = if lower { level.to_str().to_lowercase() } else { level.to_str().to_string() };
        prop_assert_eq!(text.parse::<LogLevel>().unwrap(), level);
    }
}

// ============================================================================
// Colored formatter
// ============================================================================

proptest! {
    /// Stripping the escapes leaves the original message in the output
    #[test]
    fn test_colored_output_contains_message(level in any_level(), message in plain_text()) {
        let formatter = ColoredFormatter::new(
            FormatterConfig::new().with_format("%(levelname)s: %(message)s"),
            true,
        )
        .unwrap();
        let mut record = LogRecord::new("etl", level, message.clone());

        let output = formatter.format(&mut record);
        let stripped = ColorPalette::strip(&output);

        prop_assert!(stripped.contains(&message));
        prop_assert!(stripped.starts_with(level.to_str()));
    }

    /// The record comes back exactly as it went in
    #[test]
    fn test_colored_format_restores_record(level in any_level(), message in plain_text()) {
        let formatter = ColoredFormatter::new(FormatterConfig::default(), true).unwrap();
        let mut record = LogRecord::new("etl", level, message.clone());
        let level_name = record.level_name.clone();

        let _ = formatter.format(&mut record);

        prop_assert_eq!(&record.level_name, &level_name);
        prop_assert_eq!(&record.msg, &message);

        // a second formatter sees the untouched fields
        let plain = TextFormatter::new(FormatterConfig::new().with_format("%(levelname)s %(message)s")).unwrap();
        prop_assert_eq!(plain.format(&mut record), format!("{} {}", level.to_str(), message));
    }
}

// ============================================================================
// JSON formatter
// ============================================================================

proptest! {
    /// Every output parses, with the fixed keys plus the non-reserved extras
    #[test]
    fn test_json_output_always_parses(
        level in any_level(),
        message in ".*",
        extras in prop::collection::btree_map("[a-z_]{1,10}", ".*", 0..6),
    ) {
        let formatter = JsonFormatter::new();
        let mut context = LogContext::new();
        for (key, value) in &extras {
            context.add_field(key.clone(), value.clone());
        }
        let mut record = LogRecord::new("etl.bronze", level, message.clone()).with_extra(context);

        let output = formatter.format(&mut record);
        prop_assert!(!output.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let object = value.as_object().unwrap();

        let mut expected: BTreeSet<String> = ["timestamp", "level", "name", "message", "module", "function", "line"]
            .iter()
            .map(|key| key.to_string())
            .collect();
        for key in extras.keys() {
            if !RESERVED_ATTRS.contains(&key.as_str()) {
                expected.insert(key.clone());
            }
        }
        let actual: BTreeSet<String> = object.keys().cloned().collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(object["message"].as_str().unwrap(), message.as_str());
        prop_assert_eq!(object["name"].as_str().unwrap(), "etl.bronze");
    }
}

// ============================================================================
// Size rotation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// The active file stays within the limit and retention is bounded
    #[test]
    fn test_size_rotation_bounds(
        max_bytes in 64u64..256,
        backup_count in 1usize..4,
        messages in prop::collection::vec("[a-z]{1,40}", 1..60),
    ) {
        let dir = TempDir::new().unwrap();
        let formatter: SharedFormatter =
            Arc::new(TextFormatter::new(FormatterConfig::new().with_format("%(message)s")).unwrap());
        let policy = RotationPolicy::new()
            .with_max_size(max_bytes)
            .with_backup_count(backup_count);
        let mut handler = RotatingFileHandler::new(
            dir.path().join("size.log"),
            policy,
            LogLevel::Trace,
            formatter,
        )
        .unwrap();

        for message in messages {
            let mut record = LogRecord::new("etl", LogLevel::Info, message);
            prop_assert!(handler.handle(&mut record).unwrap());
            prop_assert!(handler.current_size() <= max_bytes);
        }

        let retained = std::fs::read_dir(dir.path()).unwrap().count();
        prop_assert!(retained <= backup_count + 1);
    }
}

// ============================================================================
// Registry
// ============================================================================

proptest! {
    /// Test capture always yields a propagating logger without handlers
    #[test]
    fn test_capture_mode_regardless_of_prior_state(
        prior_handlers in 0usize..4,
        prior_propagate in any::<bool>(),
        requested_propagate in any::<bool>(),
    ) {
        let registry = LoggerRegistry::new();
        let handlers: Vec<SharedHandler> = (0..prior_handlers)
            .map(|_| shared_handler(pipeline_log_toolkit::CaptureHandler::new(LogLevel::Trace)))
            .collect();
        registry.get(
            "etl.capture",
            LoggerOptions::new().with_handlers(handlers).with_propagate(prior_propagate),
        );

        let logger = registry.get(
            "etl.capture",
            LoggerOptions::test_capture().with_propagate(requested_propagate),
        );
        prop_assert!(logger.propagate());
        prop_assert!(logger.handlers().is_empty());
    }
}
