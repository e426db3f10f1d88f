//! Mock implementations for testing.
//!
//! This module provides a deterministic embedder and a mock LLM client that
//! can be used across different test files without duplication.

use async_trait::async_trait;
use parking_lot::Mutex;
use ragline::llm::LLMClient;
use ragline::rag::embeddings::Embedder;
use ragline::types::{AppError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Bag-of-words embedder.
///
/// Each lowercase alphanumeric word is hashed into one of `dimensions`
/// buckets and the counts are scaled to unit length, so texts sharing words
/// are close under squared L2. Output depends only on the input text.
pub struct MockEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) % self.dimensions as u64;
            vector[bucket as usize] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "mock-bow"
    }
}

#[derive(Clone, Copy)]
enum Failure {
    None,
    /// Rejected input, reported as a generation failure
    Generation,
    /// Any non-recoverable error
    Fatal,
}

/// Mock LLM client for testing with configurable responses.
///
/// Records every prompt it receives.
///
/// # Examples
///
/// ```ignore
/// // Create a client that returns a simple response
/// let client = MockLLMClient::new("  A kernel manages hardware.  ");
///
/// // Create a client whose generation always fails
/// let client = MockLLMClient::failing();
/// ```
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    failure: Failure,
    prompts: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            failure: Failure::None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client whose generation always fails (recoverable).
    pub fn failing() -> Self {
        Self {
            failure: Failure::Generation,
            ..Self::new("")
        }
    }

    /// Create a mock client that fails with a non-recoverable error.
    pub fn fatal() -> Self {
        Self {
            failure: Failure::Fatal,
            ..Self::new("")
        }
    }

    /// Prompts received so far, with their token limits
    pub fn prompts(&self) -> Vec<(String, usize)> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        self.prompts.lock().push((prompt.to_string(), max_tokens));
        match self.failure {
            Failure::None => Ok(self.response.clone()),
            Failure::Generation => Err(AppError::Generation(
                "Requested tokens exceed context window of 512".to_string(),
            )),
            Failure::Fatal => Err(AppError::InvalidInput("Mock fatal failure".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}
