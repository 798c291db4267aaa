//! Pipeline instrumentation example
//!
//! Demonstrates operation timers, a timed function wrapper, run metrics and
//! a dataset summary.
//!
//! Run with: cargo run --example pipeline_metrics

use pipeline_log_toolkit::prelude::*;
use std::fmt;
use std::thread;
use std::time::Duration;

struct Orders {
    amounts: Vec<f64>,
}

impl TabularSource for Orders {
    type Error = String;

    fn row_count(&self) -> std::result::Result<u64, String> {
        Ok(self.amounts.len() as u64)
    }

    fn schema_description(&self) -> std::result::Result<String, String> {
        Ok("root\n |-- amount: double (nullable = false)".to_string())
    }

    fn sample(&self, rows: usize) -> std::result::Result<String, String> {
        Ok(self
            .amounts
            .iter()
            .take(rows)
            .map(|amount| format!("| {:>8.2} |", amount))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn column_statistics(&self) -> std::result::Result<Option<String>, String> {
        if self.amounts.is_empty() {
            return Ok(None);
        }
        let total: f64 = self.amounts.iter().sum();
        let mean = total / self.amounts.len() as f64;
        Ok(Some(format!("amount: count={} mean={:.2}", self.amounts.len(), mean)))
    }
}

#[derive(Debug)]
struct ValidationError(String);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn extract_orders() -> Orders {
    thread::sleep(Duration::from_millis(30));
    Orders {
        amounts: (1..=20).map(|i| f64::from(i) * 12.5).collect(),
    }
}

fn main() -> Result<()> {
    println!("=== Pipeline Log Toolkit - Metrics Example ===\n");

    let registry = LoggerRegistry::new();
    registry.configure_basic(BasicConfig::new().with_level(LogLevel::Info))?;
    let logger = registry.logger("etl.orders");

    println!("1. Timing a function with a decorator:");
    let timed_extract = LogTimer::as_decorator(&logger, None, LogLevel::Info).wrap(extract_orders);
    let orders = timed_extract();

    println!("\n2. Dataset summary:");
    log_dataset_info(
        Some(&orders),
        &logger,
        &DatasetReportOptions::new("Orders").with_sample(3),
    );

    println!("\n3. Metrics collected while transforming:");
    let mut metrics = LogMetrics::new(&logger);
    metrics.start("transform");
    for amount in &orders.amounts {
        metrics.increment("rows_read");
        if *amount > 200.0 {
            metrics.increment("rows_flagged");
        }
    }
    metrics.set("source", "orders.parquet");
    metrics.stop("transform");
    metrics.start("publish");
    metrics.log("rows_flagged");
    metrics.log_all();

    println!("\n4. A failing step is logged and handed back:");
    let result: std::result::Result<(), ValidationError> = LogTimer::new(&logger, "validate")
        .time_result(|| Err(ValidationError("negative amount in row 7".to_string())));
    if let Err(e) = result {
        println!("   caller still sees the error: {}", e);
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
