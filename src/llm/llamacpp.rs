use crate::llm::client::{http_client, LLMClient};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Client for a llama.cpp `llama-server` instance.
pub struct LlamaCppClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

impl LlamaCppClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl LLMClient for LlamaCppClient {
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        let request_body = json!({
            "prompt": prompt,
            "n_predict": max_tokens,
            "stream": false
        });

        let url = format!("{}/completion", self.base_url);
        debug!(%url, max_tokens, "Sending completion request");

        let response = self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("HTTP request failed: {}", e)))?;

        // llama-server answers 400 when the prompt exceeds the context window
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "llama.cpp request failed ({}): {}",
                status, text
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse response: {}", e)))?;

        response_json
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Generation("llama.cpp response has no 'content' field".to_string())
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
