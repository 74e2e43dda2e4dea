use async_trait::async_trait;
use serde::Serialize;
use tokio_postgres::{Client, NoTls};
use tracing::{error, info};

use super::rows::{QueryOutput, rows_to_output};
use super::schema::{ALL_TABLE_CREATION_SQL, TABLE_NAMES};
use crate::config::AppConfig;
use crate::error::AppError;

/// PostgreSQL connection settings.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl PostgresConfig {
    pub fn from_app_config(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            host: config.database.host.clone(),
            port: config.database.port,
            user: config.database.user.clone(),
            password: config.get_database_password()?.to_string(),
            database: config.database.dbname.clone(),
        })
    }

    /// Build a tokio-postgres connection string.
    pub fn connection_string(&self) -> String {
        let mut params = Vec::new();

        params.push(format!("host={}", self.host));
        params.push(format!("port={}", self.port));
        params.push(format!("user={}", self.user));
        params.push(format!("dbname={}", self.database));

        if !self.password.is_empty() {
            params.push(format!("password={}", self.password));
        }

        params.push("sslmode=prefer".to_string());

        params.join(" ")
    }
}

/// Handle to the sales database. A connection is established per
/// operation and dropped when the operation completes; there is no
/// long-lived pool because the app serves one user at a time.
pub struct Database {
    config: PostgresConfig,
}

/// Dashboard counters for the UI overview panel.
#[derive(Debug, Serialize)]
pub struct Overview {
    pub customers: i64,
    pub order_lines: i64,
    pub total_revenue: f64,
    pub top_region: Option<String>,
}

impl Database {
    pub fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    pub async fn connect(&self) -> Result<Client, AppError> {
        let conn_str = self.config.connection_string();
        let (client, connection) = tokio_postgres::connect(&conn_str, NoTls)
            .await
            .map_err(|e| AppError::Database(format!("connection failed: {}", e)))?;

        // Drive the connection until the client is dropped
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Connection error: {}", e);
            }
        });

        Ok(client)
    }

    /// Create all tables if they do not exist yet, in dependency order.
    pub async fn create_schema(&self) -> Result<(), AppError> {
        let client = self.connect().await?;
        for ddl in ALL_TABLE_CREATION_SQL {
            client
                .batch_execute(ddl)
                .await
                .map_err(|e| AppError::Population(format!("schema creation failed: {}", e)))?;
        }
        info!("Schema ready ({} tables)", ALL_TABLE_CREATION_SQL.len());
        Ok(())
    }

    /// Run a fixed catalog query with text parameters.
    pub async fn run_query(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<QueryOutput, AppError> {
        let client = self.connect().await?;
        let sql_params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = params
            .iter()
            .map(|p| p as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect();

        let rows = client
            .query(sql, &sql_params)
            .await
            .map_err(|e| AppError::query(e.to_string(), Some(sql)))?;

        Ok(rows_to_output(&rows))
    }

    /// Preview the first rows of one of the known tables. The table name
    /// is checked against the schema allowlist, never interpolated from
    /// free user input.
    pub async fn preview(&self, table: &str, limit: u32) -> Result<QueryOutput, AppError> {
        if !TABLE_NAMES.contains(&table) {
            return Err(AppError::query(format!("unknown table '{}'", table), None));
        }

        let sql = format!("SELECT * FROM {} LIMIT {}", table, limit);
        let client = self.connect().await?;
        let rows = client
            .query(&sql, &[])
            .await
            .map_err(|e| AppError::query(e.to_string(), Some(&sql)))?;

        Ok(rows_to_output(&rows))
    }

    /// Dashboard counters shown above the question pane.
    pub async fn overview(&self) -> Result<Overview, AppError> {
        let client = self.connect().await?;

        let customers: i64 = client
            .query_one("SELECT COUNT(*) FROM customer", &[])
            .await
            .map_err(|e| AppError::query(e.to_string(), None))?
            .get(0);

        let order_lines: i64 = client
            .query_one("SELECT COUNT(*) FROM order_line", &[])
            .await
            .map_err(|e| AppError::query(e.to_string(), None))?
            .get(0);

        let total_revenue: f64 = client
            .query_one("SELECT COALESCE(SUM(line_total), 0)::float8 FROM order_line", &[])
            .await
            .map_err(|e| AppError::query(e.to_string(), None))?
            .get(0);

        let top_region: Option<String> = client
            .query_opt(
                "SELECT r.name
                 FROM order_line l
                 JOIN orders o USING (order_id)
                 JOIN customer c ON o.customer_id = c.customer_id
                 JOIN region r ON c.region_id = r.region_id
                 GROUP BY r.name
                 ORDER BY SUM(l.line_total) DESC
                 LIMIT 1",
                &[],
            )
            .await
            .map_err(|e| AppError::query(e.to_string(), None))?
            .map(|row| row.get(0));

        Ok(Overview {
            customers,
            order_lines,
            total_revenue,
            top_region,
        })
    }
}

/// Read-only SQL execution, the seam between the assistant and the
/// database. A trait so assistant tests can substitute a mock.
#[async_trait]
pub trait ReadOnlySql: Send + Sync {
    async fn run_read_only(&self, sql: &str) -> Result<QueryOutput, AppError>;
}

#[async_trait]
impl ReadOnlySql for Database {
    /// Execute AI-generated SQL inside a read-only transaction so a
    /// malicious or confused completion cannot mutate the database.
    async fn run_read_only(&self, sql: &str) -> Result<QueryOutput, AppError> {
        let mut client = self.connect().await?;

        let tx = client
            .build_transaction()
            .read_only(true)
            .start()
            .await
            .map_err(|e| AppError::query(e.to_string(), Some(sql)))?;

        let rows = tx
            .query(sql, &[])
            .await
            .map_err(|e| AppError::query(e.to_string(), Some(sql)))?;

        // Read-only transaction: nothing to commit, dropping rolls back
        Ok(rows_to_output(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string() {
        let config = PostgresConfig {
            host: "db.example.com".to_string(),
            port: 5433,
            user: "sales_app".to_string(),
            password: "secret".to_string(),
            database: "sales".to_string(),
        };
        let conn = config.connection_string();
        assert!(conn.contains("host=db.example.com"));
        assert!(conn.contains("port=5433"));
        assert!(conn.contains("dbname=sales"));
        assert!(conn.contains("password=secret"));
        assert!(conn.contains("sslmode=prefer"));
    }

    #[test]
    fn test_connection_string_omits_empty_password() {
        let config = PostgresConfig {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "sales".to_string(),
        };
        assert!(!config.connection_string().contains("password"));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_not_a_query_error() {
        // Port 1 is never a PostgreSQL listener; the refused connection
        // must surface as a Database error, not as a bad query
        let config = PostgresConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "postgres".to_string(),
            password: String::new(),
            database: "sales".to_string(),
        };
        let err = Database::new(config).connect().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
