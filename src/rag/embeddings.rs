//! Text embedding backends.
//!
//! The pipeline only needs one capability from an embedding model: map an
//! ordered batch of texts to one fixed-length vector each, deterministically
//! for a given model. [`Embedder`] captures that; [`OllamaEmbedder`] talks to
//! an Ollama server and, with the `local-embeddings` feature, [`LocalEmbedder`]
//! runs a fastembed ONNX model in process.

use crate::types::{AppError, Result};
use crate::utils::toml_config::{EmbeddingConfig, EmbeddingProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Order-preserving batch embedding.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `texts`, returning exactly one vector per text in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Identifier of the underlying model
    fn model_name(&self) -> &str;
}

/// Embed a single text.
pub async fn embed_one(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let mut vectors = embedder.embed(&[text.to_string()]).await?;
    check_count(1, vectors.len())?;
    Ok(vectors.swap_remove(0))
}

/// Embed `texts` in batches of `batch_size`, preserving order.
pub async fn embed_batched(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(texts.len());

    for (i, batch) in texts.chunks(batch_size).enumerate() {
        let embedded = embedder.embed(batch).await?;
        check_count(batch.len(), embedded.len())?;
        debug!(
            batch = i + 1,
            done = vectors.len() + embedded.len(),
            total = texts.len(),
            "Embedded batch"
        );
        vectors.extend(embedded);
    }

    Ok(vectors)
}

fn check_count(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(AppError::Embedding(format!(
            "expected {} embeddings, got {}",
            expected, actual
        )));
    }
    Ok(())
}

// ============= Ollama =============

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embeddings from an Ollama server (`POST /api/embed`).
pub struct OllamaEmbedder {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build HTTP client: {}", e)))?;
        let base_url: String = base_url.into();

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "Ollama embed request failed ({}): {}",
                status, text
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse response: {}", e)))?;

        check_count(texts.len(), body.embeddings.len())?;
        Ok(body.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= fastembed =============

/// In-process ONNX embeddings via fastembed.
#[cfg(feature = "local-embeddings")]
pub struct LocalEmbedder {
    model: Arc<parking_lot::Mutex<fastembed::TextEmbedding>>,
    name: String,
}

#[cfg(feature = "local-embeddings")]
impl LocalEmbedder {
    /// Load a fastembed model by name (`all-minilm` / `all-MiniLM-L6-v2`,
    /// `bge-small-en-v1.5`, `bge-base-en-v1.5`).
    pub fn new(model_name: &str) -> Result<Self> {
        use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

        let model = match model_name {
            "all-minilm" | "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
                EmbeddingModel::AllMiniLML6V2
            }
            "bge-small-en-v1.5" | "BAAI/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
            "bge-base-en-v1.5" | "BAAI/bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
            other => {
                return Err(AppError::Embedding(format!(
                    "Unsupported fastembed model '{}'",
                    other
                )))
            }
        };

        let embedding = TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(true))
            .map_err(|e| AppError::Embedding(e.to_string()))?;

        Ok(Self {
            model: Arc::new(parking_lot::Mutex::new(embedding)),
            name: model_name.to_string(),
        })
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            model
                .lock()
                .embed(texts, None)
                .map_err(|e| AppError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| AppError::Embedding(format!("Embedding task failed: {}", e)))?
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Create the configured embedder.
pub fn create_embedder(config: &EmbeddingConfig, timeout: Duration) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProviderKind::Ollama => Ok(Arc::new(OllamaEmbedder::new(
            config.base_url.clone(),
            config.model.clone(),
            timeout,
        )?)),

        #[cfg(feature = "local-embeddings")]
        EmbeddingProviderKind::Fastembed => Ok(Arc::new(LocalEmbedder::new(&config.model)?)),

        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProviderKind::Fastembed => Err(AppError::Embedding(
            "fastembed provider requires the `local-embeddings` feature".to_string(),
        )),
    }
}
