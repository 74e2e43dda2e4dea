use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration.
///
/// Non-secret settings live in a TOML file; secrets (database password,
/// AI API key, the bcrypt access hash) are pulled from environment
/// variables by `load_secrets` so they never end up in version control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseSection,
    pub assistant: AssistantSection,
    #[serde(default)]
    pub server: ServerSection,

    #[serde(skip)]
    pub database_password: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(skip)]
    pub access_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub dbname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSection {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens_sql: u32,
    pub max_tokens_summary: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let mut config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.load_secrets()?;

        Ok(config)
    }

    /// Parse the TOML file without touching the environment. The
    /// populate binary only needs the database secret, not the AI key.
    pub fn from_file_without_secrets(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn load_secrets(&mut self) -> Result<()> {
        self.load_database_secret()?;

        self.api_key = env::var("OPENAI_API_KEY")
            .context("Missing environment variable: OPENAI_API_KEY")?
            .into();

        self.access_hash = env::var("SALES_ACCESS_HASH")
            .context("Missing environment variable: SALES_ACCESS_HASH")?
            .into();

        Ok(())
    }

    pub fn load_database_secret(&mut self) -> Result<()> {
        self.database_password = env::var("SALES_DB_PASSWORD")
            .context("Missing environment variable: SALES_DB_PASSWORD")?
            .into();

        Ok(())
    }

    pub fn get_database_password(&self) -> Result<&str> {
        self.database_password
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Database password not loaded"))
    }

    pub fn get_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("AI API key not loaded"))
    }

    pub fn get_access_hash(&self) -> Result<&str> {
        self.access_hash
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Access password hash not loaded"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseSection {
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                dbname: "sales".to_string(),
            },
            assistant: AssistantSection {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.15,
                max_tokens_sql: 420,
                max_tokens_summary: 220,
            },
            server: ServerSection::default(),
            database_password: None,
            api_key: None,
            access_hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.assistant.model, "gpt-4o-mini");
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [database]
            host = "db.example.com"
            port = 5433
            user = "sales_app"
            dbname = "sales"

            [assistant]
            base_url = "https://api.openai.com/v1"
            model = "gpt-4o-mini"
            temperature = 0.2
            max_tokens_sql = 400
            max_tokens_summary = 200
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.host, "db.example.com");
        assert_eq!(config.database.port, 5433);
        // [server] omitted falls back to the default bind
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_secrets_loading() {
        unsafe {
            env::set_var("SALES_DB_PASSWORD", "pg_secret");
            env::set_var("OPENAI_API_KEY", "sk-test");
            env::set_var("SALES_ACCESS_HASH", "$2b$12$abcdefghijklmnopqrstuv");
        }

        let mut config = AppConfig::default();
        let result = config.load_secrets();
        assert!(result.is_ok());
        assert_eq!(config.get_database_password().unwrap(), "pg_secret");
        assert_eq!(config.get_api_key().unwrap(), "sk-test");

        // Clean up
        unsafe {
            env::remove_var("SALES_DB_PASSWORD");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("SALES_ACCESS_HASH");
        }
    }
}
