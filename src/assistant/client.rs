use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::error::AppError;

/// Seam over the external completion service so the assistant's retry
/// logic can be tested without network access.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, AppError>;
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiClient {
    client: wreq::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self, AppError> {
        let client = wreq::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Service(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl CompletionApi for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "temperature": temperature,
            "max_tokens": max_tokens,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        debug!("Requesting completion from {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Service(format!("completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Service(format!(
                "completion API returned {}: {}",
                status, text
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Service(format!("invalid completion response: {}", e)))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                AppError::Service("completion response had no message content".to_string())
            })
    }
}
