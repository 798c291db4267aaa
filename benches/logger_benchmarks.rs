//! Criterion benchmarks for pipeline_log_toolkit

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pipeline_log_toolkit::handlers::CaptureHandler;
use pipeline_log_toolkit::prelude::*;
use pipeline_log_toolkit::TimeConverter;
use std::sync::Arc;

fn sample_record() -> LogRecord {
    LogRecord::new("etl.bronze", LogLevel::Error, "Failed to write partition {}")
        .with_args(vec![FieldValue::Int(42)])
        .with_location("src/jobs/bronze.rs", 118, "write_partition")
        .with_extra(
            LogContext::new()
                .with_field("request_id", "abc-123")
                .with_field("rows", 1200),
        )
}

// ============================================================================
// Formatter Benchmarks
// ============================================================================

fn bench_formatters(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatters");
    group.throughput(Throughput::Elements(1));

    let text = TextFormatter::default();
    group.bench_function("text", |b| {
        let mut record = sample_record();
        b.iter(|| black_box(text.format(black_box(&mut record))));
    });

    let brace = TextFormatter::new(
        FormatterConfig::new()
            .with_format("{asctime} | {levelname:<8} | {name} | {request_id} | {message}")
            .with_style(FormatStyle::Brace),
    )
    .expect("valid template");
    group.bench_function("text_brace_with_extra", |b| {
        let mut record = sample_record();
        b.iter(|| black_box(brace.format(black_box(&mut record))));
    });

    let colored = ColoredFormatter::new(FormatterConfig::default(), true).expect("valid template");
    group.bench_function("colored", |b| {
        let mut record = sample_record();
        b.iter(|| black_box(colored.format(black_box(&mut record))));
    });

    let json = JsonFormatter::new();
    group.bench_function("json", |b| {
        let mut record = sample_record();
        b.iter(|| black_box(json.format(black_box(&mut record))));
    });

    let zoned = JsonFormatter::new().with_converter(
        TimeConverter::for_timezone("America/Sao_Paulo").expect("known zone"),
    );
    group.bench_function("json_with_timezone", |b| {
        let mut record = sample_record();
        b.iter(|| black_box(zoned.format(black_box(&mut record))));
    });

    group.finish();
}

// ============================================================================
// Logger Benchmarks
// ============================================================================

fn bench_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("logging");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::new("etl.bench");
    logger.set_level(LogLevel::Info);
    logger.add_handler(shared_handler(CaptureHandler::with_formatter(
        LogLevel::Critical,
        Arc::new(JsonFormatter::new()),
    )));

    group.bench_function("filtered_by_logger_level", |b| {
        b.iter(|| logger.debug(black_box("Debug message")));
    });

    group.bench_function("filtered_by_handler_level", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    group.bench_function("macro_filtered", |b| {
        b.iter(|| pipeline_log_toolkit::debug!(logger, "row {}", black_box(7)));
    });

    group.finish();
}

// ============================================================================
// Hierarchy Benchmarks
// ============================================================================

fn bench_hierarchy(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchy");

    let registry = LoggerRegistry::new();
    registry.logger("etl").set_level(LogLevel::Warning);
    let leaf = registry.logger("etl.bronze.orders.daily");

    group.bench_function("effective_level_four_deep", |b| {
        b.iter(|| black_box(leaf.effective_level()));
    });

    group.bench_function("registry_lookup", |b| {
        b.iter(|| black_box(registry.logger(black_box("etl.bronze.orders.daily"))));
    });

    group.finish();
}

// ============================================================================
// Instrumentation Benchmarks
// ============================================================================

fn bench_instrumentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("instrumentation");

    let logger = Logger::new("etl.instrument");
    logger.set_level(LogLevel::Warning);

    group.bench_function("timer_disabled_level", |b| {
        b.iter(|| LogTimer::new(&logger, "noop").time(|| black_box(1 + 1)));
    });

    let mut metrics = LogMetrics::new(&logger);
    group.bench_function("metrics_increment", |b| {
        b.iter(|| black_box(metrics.increment(black_box("rows"))));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_formatters,
    bench_logging,
    bench_hierarchy,
    bench_instrumentation
);

criterion_main!(benches);
