//! Query embedding cache.
//!
//! Interactive sessions tend to repeat questions, and embeddings are
//! deterministic for a fixed model, so [`CachedEmbedder`] keeps recent
//! vectors in an LRU keyed by the exact input text. Only texts missing from
//! the cache are sent to the wrapped embedder, in one batch.

use crate::rag::embeddings::Embedder;
use crate::types::Result;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: usize,
}

impl CacheStats {
    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// LRU-cached wrapper around another [`Embedder`].
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Option<Mutex<LruCache<String, Vec<f32>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedEmbedder {
    /// Wrap `inner` with room for `capacity` vectors. A capacity of 0
    /// disables caching.
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize) -> Self {
        Self {
            inner,
            cache: NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.cache.as_ref().map(|c| c.lock().len()).unwrap_or(0),
        }
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let Some(cache) = &self.cache else {
            return self.inner.embed(texts).await;
        };

        let mut results: Vec<Option<Vec<f32>>> = {
            let mut cache = cache.lock();
            texts.iter().map(|t| cache.get(t).cloned()).collect()
        };

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| results[i].is_none()).collect();
        self.hits
            .fetch_add((texts.len() - missing.len()) as u64, Ordering::Relaxed);
        self.misses.fetch_add(missing.len() as u64, Ordering::Relaxed);
        trace!(hits = texts.len() - missing.len(), misses = missing.len(), "Embedding cache lookup");

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let embedded = self.inner.embed(&batch).await?;

            let mut cache = cache.lock();
            for (&i, vector) in missing.iter().zip(embedded) {
                cache.put(texts[i].clone(), vector.clone());
                results[i] = Some(vector);
            }
        }

        // holes from a short inner reply surface as a count mismatch upstream
        Ok(results.into_iter().flatten().collect())
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
