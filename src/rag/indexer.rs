//! Building, saving and loading the vector index for a chunk store.

use crate::rag::embeddings::{embed_batched, Embedder};
use crate::rag::store::ChunkStore;
use crate::types::{AppError, Result};
use ragline_vector::{DistanceMetric, FlatIndex};
use std::path::Path;
use tracing::info;

/// Embed every chunk of `store` and build an exact index over the vectors.
///
/// Vector `i` belongs to chunk `i`.
pub async fn build_index(
    embedder: &dyn Embedder,
    store: &ChunkStore,
    batch_size: usize,
    metric: DistanceMetric,
) -> Result<FlatIndex> {
    if store.is_empty() {
        return Err(AppError::InvalidInput(
            "chunk store is empty, nothing to index".to_string(),
        ));
    }

    info!(
        chunks = store.len(),
        model = embedder.model_name(),
        "Generating embeddings"
    );
    let vectors = embed_batched(embedder, &store.texts(), batch_size).await?;
    let index = FlatIndex::from_vectors(&vectors, metric)?;

    info!(
        vectors = index.len(),
        dimensions = index.dimensions(),
        metric = %index.metric(),
        "Index built"
    );
    Ok(index)
}

/// Persist `index` to `path`.
pub async fn save_index(path: impl AsRef<Path>, index: &FlatIndex) -> Result<()> {
    ragline_vector::save_index(path, index).await?;
    Ok(())
}

/// Load an index file. A missing file is [`AppError::InputNotFound`].
pub async fn load_index(path: impl AsRef<Path>) -> Result<FlatIndex> {
    let path = path.as_ref();
    if !tokio::fs::try_exists(path).await? {
        return Err(AppError::InputNotFound(path.to_path_buf()));
    }
    Ok(ragline_vector::load_index(path).await?)
}
