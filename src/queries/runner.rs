use tracing::info;

use super::catalog;
use crate::db::{Database, QueryOutput};
use crate::error::AppError;

/// Run a catalog query by name, validating the parameter count before
/// touching the database.
pub async fn run(db: &Database, name: &str, params: &[String]) -> Result<QueryOutput, AppError> {
    let def = catalog::find(name)
        .ok_or_else(|| AppError::query(format!("unknown query '{}'", name), None))?;

    if params.len() != def.params.len() {
        return Err(AppError::query(
            format!(
                "query '{}' expects {} parameter(s), got {}",
                def.name,
                def.params.len(),
                params.len()
            ),
            None,
        ));
    }

    info!("Running catalog query {}", def.name);
    db.run_query(def.sql, params).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::{Database, PostgresConfig};

    fn local_db() -> Database {
        let mut config = AppConfig::default();
        config.database_password = Some(String::new());
        Database::new(PostgresConfig::from_app_config(&config).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_query_is_rejected_before_connecting() {
        let err = run(&local_db(), "ex99", &[]).await.unwrap_err();
        assert!(err.to_string().contains("unknown query"));
    }

    #[tokio::test]
    async fn test_wrong_arity_is_rejected_before_connecting() {
        // ex1 needs a customer name
        let err = run(&local_db(), "ex1", &[]).await.unwrap_err();
        assert!(err.to_string().contains("expects 1 parameter"));

        // ex4 takes none
        let err = run(&local_db(), "ex4", &["extra".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expects 0 parameter"));
    }
}
