//! Query-time retrieval: embed the question, search the index, look the hits
//! up in the chunk store.

use crate::rag::embeddings::{embed_one, Embedder};
use crate::rag::store::ChunkStore;
use crate::types::{AppError, Result};
use ragline_vector::FlatIndex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Appended to text cut at the character limit.
pub const ELLIPSIS: &str = "...";

/// Cut `text` to `max_chars` characters, appending [`ELLIPSIS`] when
/// anything was dropped. Counts Unicode scalar values, not bytes.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    /// 1-based rank
    pub rank: usize,
    pub id: usize,
    pub distance: f32,
    pub heading: String,
    /// Full chunk text (heading and body)
    pub text: String,
}

impl RetrievedChunk {
    pub fn preview(&self, max_chars: usize) -> String {
        truncate_chars(&self.text, max_chars)
    }
}

/// Composes an embedder, a built index and the chunk store it was built from.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<FlatIndex>,
    store: Arc<ChunkStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<FlatIndex>, store: Arc<ChunkStore>) -> Self {
        if index.len() != store.len() {
            warn!(
                index = index.len(),
                chunks = store.len(),
                "Index and chunk store sizes differ; rebuild the index"
            );
        }
        Self {
            embedder,
            index,
            store,
        }
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Top-`k` chunks for `query`, nearest first.
    ///
    /// Fails with [`AppError::NotFound`] when the index returns an id the
    /// chunk store does not have.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let query_vector = embed_one(self.embedder.as_ref(), query).await?;
        let hits = self.index.search(&query_vector, k)?;

        let results = hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| {
                let chunk = self.store.get(hit.id).ok_or_else(|| {
                    AppError::NotFound(format!(
                        "chunk {} is in the index but not in the chunk store ({} chunks)",
                        hit.id,
                        self.store.len()
                    ))
                })?;
                Ok(RetrievedChunk {
                    rank: i + 1,
                    id: hit.id,
                    distance: hit.distance,
                    heading: chunk.heading().to_string(),
                    text: chunk.text(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(query, k, results = results.len(), "Retrieved chunks");
        Ok(results)
    }

    /// Context strings for `query`: the top-`k` chunk texts in rank order,
    /// each cut to `max_chars` characters.
    ///
    /// The cut applies to the whole chunk text, so the heading and the newline
    /// after it count toward `max_chars`.
    pub async fn retrieve(&self, query: &str, k: usize, max_chars: usize) -> Result<Vec<String>> {
        Ok(self
            .search(query, k)
            .await?
            .iter()
            .map(|r| r.preview(max_chars))
            .collect())
    }
}
