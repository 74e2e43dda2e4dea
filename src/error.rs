use thiserror::Error;

/// Error kinds surfaced by the sales assistant.
///
/// Cleaning and population problems are normally collected into batch
/// reports; these variants cover the cases where a stage cannot continue
/// at all (unreadable input, no database connection).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("cleaning error: {0}")]
    Cleaning(String),

    #[error("population error: {0}")]
    Population(String),

    #[error("database unavailable: {0}")]
    Database(String),

    #[error("query error: {message}")]
    Query {
        message: String,
        /// The SQL that failed, included so the UI can show it.
        sql: Option<String>,
    },

    #[error("AI service error: {0}")]
    Service(String),

    #[error("authentication failed")]
    Auth,
}

impl AppError {
    pub fn query(message: impl Into<String>, sql: Option<&str>) -> Self {
        AppError::Query {
            message: message.into(),
            sql: sql.map(|s| s.to_string()),
        }
    }
}
