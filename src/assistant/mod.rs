pub mod client;
pub mod sql_extract;

pub use client::{CompletionApi, OpenAiClient};
pub use sql_extract::extract_sql;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AssistantSection;
use crate::db::{QueryOutput, ReadOnlySql};
use crate::db::schema::SCHEMA_CONTEXT;
use crate::error::AppError;

/// How many correction round-trips a failed completion gets before the
/// error is surfaced to the caller.
pub const MAX_SQL_RETRIES: usize = 1;

/// Everything the UI needs about one answered question.
#[derive(Debug, Serialize)]
pub struct Answer {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub explanation: String,
}

/// Turns a natural-language question into SQL via an external
/// completion API, runs it read-only, and asks the API to explain the
/// result. Generic over the API and database seams so tests can bound
/// the retry behaviour with mocks.
pub struct Assistant<C: CompletionApi> {
    api: C,
    config: AssistantSection,
}

impl<C: CompletionApi> Assistant<C> {
    pub fn new(api: C, config: AssistantSection) -> Self {
        Self { api, config }
    }

    pub async fn answer<D: ReadOnlySql>(
        &self,
        db: &D,
        question: &str,
    ) -> Result<Answer, AppError> {
        let mut prompt = sql_prompt(question);
        let mut last_error: Option<AppError> = None;

        for attempt in 0..=MAX_SQL_RETRIES {
            let response = self
                .api
                .complete(&prompt, self.config.temperature, self.config.max_tokens_sql)
                .await?;

            let sql = extract_sql(&response).ok_or_else(|| {
                AppError::Service("completion contained no SQL statement".to_string())
            })?;

            match db.run_read_only(&sql).await {
                Ok(output) => {
                    info!("Question answered on attempt {}", attempt + 1);
                    let explanation = self.explain(question, &sql, &output).await?;
                    return Ok(Answer {
                        sql,
                        columns: output.columns,
                        rows: output.rows,
                        explanation,
                    });
                }
                Err(AppError::Query { message, .. }) if attempt < MAX_SQL_RETRIES => {
                    warn!("Generated SQL failed, requesting a correction: {}", message);
                    prompt = correction_prompt(question, &sql, &message);
                    last_error = Some(AppError::query(message, Some(&sql)));
                }
                Err(e) => return Err(e),
            }
        }

        // Unreachable in practice: the final loop iteration either
        // returns an answer or returns its error directly.
        Err(last_error
            .unwrap_or_else(|| AppError::Service("no SQL attempt was made".to_string())))
    }

    async fn explain(
        &self,
        question: &str,
        sql: &str,
        output: &QueryOutput,
    ) -> Result<String, AppError> {
        let prompt = explanation_prompt(question, sql, output);
        self.api
            .complete(&prompt, 0.35, self.config.max_tokens_summary)
            .await
    }
}

fn sql_prompt(question: &str) -> String {
    format!(
        "You are a PostgreSQL analyst for a sales database.\n\
         \n\
         {schema}\n\
         Guidelines:\n\
         - Answer with exactly one SELECT statement (a WITH clause is fine)\n\
         - Join through the foreign keys shown above\n\
         - Never modify data\n\
         - Add LIMIT 100 unless the question asks for a specific count\n\
         - Wrap the statement in a ```sql code fence\n\
         \n\
         Question: {question}",
        schema = SCHEMA_CONTEXT,
        question = question
    )
}

fn correction_prompt(question: &str, failed_sql: &str, error: &str) -> String {
    format!(
        "The following PostgreSQL query failed.\n\
         \n\
         Query:\n```sql\n{sql}\n```\n\
         Error: {error}\n\
         \n\
         {schema}\n\
         Fix the query so it answers the original question. Reply with \
         exactly one corrected SELECT statement in a ```sql code fence.\n\
         \n\
         Question: {question}",
        sql = failed_sql,
        error = error,
        schema = SCHEMA_CONTEXT,
        question = question
    )
}

fn explanation_prompt(question: &str, sql: &str, output: &QueryOutput) -> String {
    let sample: Vec<&Vec<Value>> = output.rows.iter().take(6).collect();
    let sample_json = serde_json::to_string(&sample).unwrap_or_default();

    format!(
        "A user asked: {question}\n\
         \n\
         This SQL answered it:\n```sql\n{sql}\n```\n\
         Columns: {columns:?}\n\
         First rows: {sample}\n\
         Total rows: {count}\n\
         \n\
         Summarize the result for the user in two or three plain sentences. \
         Mention concrete numbers. Do not repeat the SQL.",
        question = question,
        sql = sql,
        columns = output.columns,
        sample = sample_json,
        count = output.rows.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedApi {
        responses: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(responses: Vec<&str>) -> Self {
            let mut responses: Vec<String> =
                responses.into_iter().map(String::from).collect();
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionApi for ScriptedApi {
        async fn complete(
            &self,
            _prompt: &str,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AppError::Service("script exhausted".to_string()))
        }
    }

    struct FailingDb {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReadOnlySql for FailingDb {
        async fn run_read_only(&self, sql: &str) -> Result<QueryOutput, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::query("syntax error", Some(sql)))
        }
    }

    struct HealthyDb;

    #[async_trait]
    impl ReadOnlySql for HealthyDb {
        async fn run_read_only(&self, _sql: &str) -> Result<QueryOutput, AppError> {
            Ok(QueryOutput {
                columns: vec!["region".to_string(), "total".to_string()],
                rows: vec![vec![
                    serde_json::json!("Europe"),
                    serde_json::json!(50.0),
                ]],
            })
        }
    }

    fn test_config() -> AssistantSection {
        AssistantSection {
            base_url: "http://unused".to_string(),
            model: "test".to_string(),
            temperature: 0.15,
            max_tokens_sql: 420,
            max_tokens_summary: 220,
        }
    }

    #[tokio::test]
    async fn test_success_path_returns_sql_rows_and_explanation() {
        let api = ScriptedApi::new(vec![
            "```sql\nSELECT r.name AS region, SUM(l.line_total) AS total FROM order_line l JOIN orders o ON l.order_id = o.order_id JOIN customer c ON o.customer_id = c.customer_id JOIN region r ON c.region_id = r.region_id GROUP BY r.name\n```",
            "Europe leads with 50.0 in revenue.",
        ]);
        let assistant = Assistant::new(api, test_config());

        let answer = assistant
            .answer(&HealthyDb, "Which region makes the most money?")
            .await
            .unwrap();

        assert!(answer.sql.starts_with("SELECT"));
        assert_eq!(answer.columns, vec!["region", "total"]);
        assert_eq!(answer.rows.len(), 1);
        assert_eq!(answer.explanation, "Europe leads with 50.0 in revenue.");
        assert_eq!(assistant.api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        // Every completion produces SQL the database rejects; the
        // assistant must stop after the single correction cycle.
        let api = ScriptedApi::new(vec![
            "```sql\nSELECT broken FROM nowhere\n```",
            "```sql\nSELECT still_broken FROM nowhere\n```",
        ]);
        let assistant = Assistant::new(api, test_config());
        let db = FailingDb {
            calls: AtomicUsize::new(0),
        };

        let err = assistant.answer(&db, "anything").await.unwrap_err();

        assert!(matches!(err, AppError::Query { .. }));
        assert_eq!(assistant.api.call_count(), 2);
        assert_eq!(db.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_service_errors_are_not_retried() {
        let api = ScriptedApi::new(vec![]);
        let assistant = Assistant::new(api, test_config());

        let err = assistant.answer(&HealthyDb, "anything").await.unwrap_err();

        assert!(matches!(err, AppError::Service(_)));
        assert_eq!(assistant.api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_completion_without_sql_is_a_service_error() {
        let api = ScriptedApi::new(vec!["I cannot help with that."]);
        let assistant = Assistant::new(api, test_config());

        let err = assistant.answer(&HealthyDb, "anything").await.unwrap_err();
        assert!(matches!(err, AppError::Service(_)));
    }
}
