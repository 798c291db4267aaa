//! File logging example
//!
//! Demonstrates a file logging session writing JSON lines with size
//! rotation, plus a colored text session on a daily schedule.
//!
//! Run with: cargo run --example file_logging

use pipeline_log_toolkit::prelude::*;

fn main() -> Result<()> {
    println!("=== Pipeline Log Toolkit - File Logging Example ===\n");

    let registry = LoggerRegistry::new();

    println!("1. JSON lines, rotated at 1 MiB, three backups:");
    let bronze = setup_file_logging(
        &registry,
        FileLoggingConfig::new("etl.bronze")
            .with_log_dir("./logs/")
            .with_log_folder("bronze")
            .with_size_rotation(1024 * 1024)
            .with_backup_count(3)
            .with_json_format(true),
    )?;

    bronze.info("Ingest started");
    for i in 1..=5 {
        bronze.log_with_context(
            LogLevel::Info,
            format!("Processed batch {}/5", i),
            LogContext::new().with_field("batch", i).with_field("rows", 500 * i),
        );
    }
    bronze.warning("Batch 3 took longer than expected");
    println!("   Written to {}", bronze.log_file().display());

    println!("\n2. Text file rotated at midnight, timestamps in UTC:");
    let silver = setup_file_logging(
        &registry,
        FileLoggingConfig::new("etl.silver")
            .with_log_folder("silver")
            .with_time_rotation(When::Midnight, 1)
            .with_timezone("UTC")
            .with_date_format("%Y-%m-%dT%H:%M:%S"),
    )?;

    silver.info("Deduplicating orders");
    silver.debug("Debug goes to the file only");
    silver.error("Failed to load optional lookup table");
    println!("   Written to {}", silver.log_file().display());

    // close() is the teardown path: flush, close and detach every handler
    for session in [bronze, silver] {
        for failure in session.close() {
            eprintln!("close failed: {}", failure);
        }
    }

    println!("\n=== Example completed successfully! ===");
    println!("Check the './logs/' directory for the full log output");

    Ok(())
}
