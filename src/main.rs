use anyhow::{Context, Result};
use std::env;
use tracing::info;

use sales_assistant::assistant::{Assistant, OpenAiClient};
use sales_assistant::auth::AccessGate;
use sales_assistant::config::AppConfig;
use sales_assistant::db::{Database, PostgresConfig};
use sales_assistant::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config_path = env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());

    info!("🚀 Starting Sales Assistant");

    let config = AppConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    info!(
        "Loaded configuration: {}@{}:{}/{}",
        config.database.user, config.database.host, config.database.port, config.database.dbname
    );

    let db = Database::new(PostgresConfig::from_app_config(&config)?);

    let client = OpenAiClient::new(
        &config.assistant.base_url,
        config.get_api_key()?,
        &config.assistant.model,
    )?;
    let assistant = Assistant::new(client, config.assistant.clone());

    let gate = AccessGate::new(config.get_access_hash()?);

    let state = AppState::new(db, assistant, gate);
    server::serve(&config.server.bind, state).await
}
