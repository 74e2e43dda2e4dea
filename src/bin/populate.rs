//! One-shot loader: cleans the raw sales export and populates the
//! normalized database. Safe to re-run against the same target.

use anyhow::{Context, Result};
use std::env;
use tracing::{info, warn};

use sales_assistant::cleaner::{FrameNormalizer, SalesCleaner, read_raw_frame};
use sales_assistant::config::AppConfig;
use sales_assistant::db::{Database, PostgresConfig};
use sales_assistant::populator::Populator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let data_path = env::args().nth(1).unwrap_or_else(|| "data/sales.tsv".to_string());
    let config_path = env::args().nth(2).unwrap_or_else(|| "config.toml".to_string());

    info!("🚀 Starting sales data load from {}", data_path);

    let mut config = AppConfig::from_file_without_secrets(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    config.load_database_secret()?;

    // Clean
    let mut df = read_raw_frame(&data_path)
        .with_context(|| format!("Failed to read raw sales file {}", data_path))?;
    FrameNormalizer.normalize_frame(&mut df)?;

    let (tables, report) = SalesCleaner::new().clean(&df)?;
    info!("Cleaning: {}", report.summary());
    for excluded in &report.excluded {
        warn!("Excluded row {}: {}", excluded.row, excluded.reason);
    }
    for flag in &report.flags {
        warn!("Flagged row {} [{}]: {}", flag.row, flag.field, flag.detail);
    }

    // Populate
    let db = Database::new(PostgresConfig::from_app_config(&config)?);
    db.create_schema().await?;

    let population = Populator::new().populate(&db, &tables).await?;

    for table in &population.tables {
        if table.skipped.is_empty() {
            info!("✅ {}: {} rows", table.table, table.written);
        } else {
            warn!(
                "⚠️ {}: {} rows written, {} skipped",
                table.table,
                table.written,
                table.skipped.len()
            );
        }
    }
    info!("✅ Load complete: {}", population.summary());

    Ok(())
}
