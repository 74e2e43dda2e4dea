pub mod page;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::assistant::{Assistant, OpenAiClient};
use crate::auth::AccessGate;
use crate::db::Database;
use crate::error::AppError;
use crate::queries;

/// Questions shorter than this are rejected before spending an API call.
const MIN_QUESTION_LEN: usize = 10;

pub struct AppState {
    pub db: Database,
    pub assistant: Assistant<OpenAiClient>,
    pub gate: AccessGate,
    sessions: RwLock<HashSet<String>>,
}

impl AppState {
    pub fn new(db: Database, assistant: Assistant<OpenAiClient>, gate: AccessGate) -> Self {
        Self {
            db,
            assistant,
            gate,
            sessions: RwLock::new(HashSet::new()),
        }
    }
}

/// Bind and serve the two-pane UI plus its JSON API.
pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("🚀 Sales assistant listening on {}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/", get(index))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/overview", get(overview))
        .route("/api/queries", get(list_queries))
        .route("/api/queries/{name}", post(run_query))
        .route("/api/ask", post(ask))
        .route("/api/preview/{table}", get(preview))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(page::INDEX_HTML)
}

#[derive(Deserialize)]
struct LoginRequest {
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.gate.verify(&req.password)? {
        return Err(ApiError(AppError::Auth));
    }

    let token = Uuid::new_v4().to_string();
    state.sessions.write().await.insert(token.clone());
    info!("Session opened");
    Ok(Json(json!({ "token": token })))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = require_session(&state, &headers).await?;
    state.sessions.write().await.remove(&token);
    Ok(Json(json!({ "ok": true })))
}

async fn overview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_session(&state, &headers).await?;
    let overview = state.db.overview().await?;
    Ok(Json(serde_json::to_value(overview).unwrap_or_default()))
}

async fn list_queries(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_session(&state, &headers).await?;
    Ok(Json(serde_json::to_value(queries::catalog()).unwrap_or_default()))
}

#[derive(Deserialize, Default)]
struct RunQueryRequest {
    #[serde(default)]
    params: Vec<String>,
}

async fn run_query(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(req): Json<RunQueryRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_session(&state, &headers).await?;
    let output = queries::run(&state.db, &name, &req.params).await?;
    Ok(Json(serde_json::to_value(output).unwrap_or_default()))
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

async fn ask(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_session(&state, &headers).await?;

    let question = req.question.trim();
    if question.len() < MIN_QUESTION_LEN {
        return Err(ApiError(AppError::query(
            format!("question must be at least {} characters", MIN_QUESTION_LEN),
            None,
        )));
    }

    let answer = state.assistant.answer(&state.db, question).await?;
    Ok(Json(serde_json::to_value(answer).unwrap_or_default()))
}

async fn preview(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_session(&state, &headers).await?;
    let output = state.db.preview(&table, 10).await?;
    Ok(Json(serde_json::to_value(output).unwrap_or_default()))
}

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError(AppError::Auth))?;

    if state.sessions.read().await.contains(token) {
        Ok(token.to_string())
    } else {
        Err(ApiError(AppError::Auth))
    }
}

/// JSON error envelope. Query failures carry the SQL that failed so the
/// UI can show it next to the message.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            AppError::Auth => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "authentication failed" }),
            ),
            AppError::Query { message, sql } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "sql": sql }),
            ),
            AppError::Service(message) => {
                (StatusCode::BAD_GATEWAY, json!({ "error": message }))
            }
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": other.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let resp = ApiError(AppError::Auth).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = ApiError(AppError::query("bad sql", Some("SELECT x"))).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = ApiError(AppError::Service("timeout".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        // A down database is a server-side problem, not a bad request
        let resp = ApiError(AppError::Database("refused".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = ApiError(AppError::Cleaning("boom".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
