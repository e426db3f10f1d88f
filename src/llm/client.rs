//! LLM Client abstractions and provider management
//!
//! Answer generation needs a single blocking call: prompt in, completion
//! out, bounded by a token limit. Two local backends are supported:
//! - **Ollama**: `POST /api/generate`
//! - **LlamaCpp**: a `llama-server` instance, `POST /completion`

use crate::types::Result;
use crate::utils::toml_config::{GenerationConfig, GenerationProviderKind};
use async_trait::async_trait;
use std::time::Duration;

/// Generic LLM client trait for provider abstraction
///
/// Every failure of `generate` is reported as
/// [`AppError::Generation`](crate::types::AppError::Generation), which the
/// chat loop treats as recoverable.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion of at most `max_tokens` tokens
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
///
/// | Provider | Endpoint | Token limit field |
/// |----------|----------|-------------------|
/// | Ollama | `/api/generate` | `options.num_predict` |
/// | LlamaCpp | `/completion` | `n_predict` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     model: "llama2:7b-chat".to_string(),
    /// };
    /// ```
    Ollama { base_url: String, model: String },

    /// llama.cpp HTTP server serving a single GGUF model
    ///
    /// `model` is informational; the server decides which model runs.
    LlamaCpp { base_url: String, model: String },
}

impl Provider {
    /// Provider described by the `[generation]` config section
    pub fn from_config(config: &GenerationConfig) -> Self {
        let base_url = config.base_url.clone();
        let model = config.model.clone();
        match config.provider {
            GenerationProviderKind::Ollama => Provider::Ollama { base_url, model },
            GenerationProviderKind::LlamaCpp => Provider::LlamaCpp { base_url, model },
        }
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn create_client(&self, timeout: Duration) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone(), timeout)?,
            )),

            Provider::LlamaCpp { base_url, model } => Ok(Box::new(
                super::llamacpp::LlamaCppClient::new(base_url.clone(), model.clone(), timeout)?,
            )),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Ollama { .. } => "Ollama",
            Provider::LlamaCpp { .. } => "LlamaCpp",
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            Provider::Ollama { base_url, .. } | Provider::LlamaCpp { base_url, .. } => base_url,
        }
    }
}

/// Build an HTTP client with the request timeout used by every provider
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| crate::types::AppError::Generation(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_config() {
        let config = GenerationConfig::default();
        let provider = Provider::from_config(&config);
        assert_eq!(provider.name(), "Ollama");
        assert_eq!(provider.base_url(), "http://localhost:11434");

        let config = GenerationConfig {
            provider: GenerationProviderKind::LlamaCpp,
            base_url: "http://localhost:8080".to_string(),
            ..Default::default()
        };
        let provider = Provider::from_config(&config);
        assert_eq!(
            provider,
            Provider::LlamaCpp {
                base_url: "http://localhost:8080".to_string(),
                model: "llama2:7b-chat".to_string(),
            }
        );
    }

    #[test]
    fn test_create_client_keeps_model_name() {
        let provider = Provider::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "llama2:7b-chat".to_string(),
        };
        let client = match provider.create_client(Duration::from_secs(5)) {
            Ok(client) => client,
            Err(e) => panic!("client creation failed: {}", e),
        };
        assert_eq!(client.model_name(), "llama2:7b-chat");
    }
}
