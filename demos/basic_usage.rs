//! Basic logger usage example
//!
//! Demonstrates console logging through the registry, level inheritance
//! and the formatting macros.
//!
//! Run with: cargo run --example basic_usage

use pipeline_log_toolkit::prelude::*;
use pipeline_log_toolkit::{critical, info, warning};

fn main() -> Result<()> {
    println!("=== Pipeline Log Toolkit - Basic Usage Example ===\n");

    let registry = LoggerRegistry::new();

    // One colored console handler on the root logger
    registry.configure_basic(
        BasicConfig::new()
            .with_level(LogLevel::Debug)
            .with_formatter(
                FormatterConfig::new()
                    .with_format("%(asctime)s [%(levelname)-8s] %(name)s:%(funcName)s - %(message)s"),
            ),
    )?;

    println!("1. Logging at different levels:");
    let logger = registry.logger("etl.bronze");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warning("This is a warning message");
    logger.error("This is an error message");
    logger.critical("This is a critical message");

    println!("\n2. Levels are inherited from the nearest configured ancestor:");
    registry.logger("etl").set_level(LogLevel::Warning);
    let orders = registry.logger("etl.bronze.orders");
    println!("   'etl.bronze' has DEBUG, 'etl.bronze.orders' inherits it:");
    orders.debug("Debug message (visible)");
    logger.clear_level();
    println!("   'etl.bronze' cleared, 'etl' says WARNING:");
    orders.info("Info message (hidden)");
    orders.warning("Warning message (visible)");

    println!("\n3. Macros record the calling function:");
    let rows = 1200;
    info!(orders, "Loaded {} rows", rows);
    warning!(orders, "{} rows rejected", 3);
    critical!(orders, "Partition {} missing", "2024-06-01");

    println!("\n4. Structured extras:");
    orders.log_with_context(
        LogLevel::Error,
        "Write failed",
        LogContext::new()
            .with_field("table", "orders")
            .with_field("attempt", 3),
    );

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
