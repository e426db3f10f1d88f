//! Persistence layer for ragline-vector.
//!
//! An index is persisted as a self-describing binary blob:
//!
//! ```text
//! +--------+------------------------------------------------------+
//! | "RLVX" | postcard { version, dimensions, metric, data: [f32] } |
//! +--------+------------------------------------------------------+
//! ```
//!
//! `f32` values are encoded as their little-endian bit patterns, so a
//! persist/load round trip reproduces every vector, and therefore every
//! search distance, bit for bit. Vector order is the storage order.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::index::FlatIndex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const MAGIC: &[u8; 4] = b"RLVX";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct PersistedIndexRef<'a> {
    version: u32,
    dimensions: u64,
    metric: DistanceMetric,
    data: &'a [f32],
}

#[derive(Deserialize)]
struct PersistedIndex {
    version: u32,
    dimensions: u64,
    metric: DistanceMetric,
    data: Vec<f32>,
}

/// Serialize an index to an opaque byte blob.
pub fn to_bytes(index: &FlatIndex) -> Result<Vec<u8>> {
    let payload = PersistedIndexRef {
        version: FORMAT_VERSION,
        dimensions: index.dimensions() as u64,
        metric: index.metric(),
        data: index.raw(),
    };

    let mut blob = MAGIC.to_vec();
    let encoded = postcard::to_allocvec(&payload)
        .map_err(|e| Error::Persistence(format!("Failed to encode index: {}", e)))?;
    blob.extend_from_slice(&encoded);
    Ok(blob)
}

/// Deserialize an index from a blob produced by [`to_bytes`].
pub fn from_bytes(blob: &[u8]) -> Result<FlatIndex> {
    let body = blob
        .strip_prefix(MAGIC.as_slice())
        .ok_or_else(|| Error::Persistence("Missing index header".to_string()))?;

    let persisted: PersistedIndex = postcard::from_bytes(body)
        .map_err(|e| Error::Persistence(format!("Failed to decode index: {}", e)))?;

    if persisted.version != FORMAT_VERSION {
        return Err(Error::Persistence(format!(
            "Unsupported index format version {}",
            persisted.version
        )));
    }

    let dimensions = usize::try_from(persisted.dimensions)
        .map_err(|_| Error::Persistence("Dimensions exceed platform limits".to_string()))?;

    FlatIndex::from_raw(dimensions, persisted.metric, persisted.data)
}

/// Save an index to a file, creating parent directories as needed.
pub async fn save_index(path: impl AsRef<Path>, index: &FlatIndex) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let blob = to_bytes(index)?;
    tokio::fs::write(path, &blob).await?;

    info!(path = ?path, count = index.len(), bytes = blob.len(), "Saved index");
    Ok(())
}

/// Load an index from a file written by [`save_index`].
pub async fn load_index(path: impl AsRef<Path>) -> Result<FlatIndex> {
    let path = path.as_ref();
    let blob = tokio::fs::read(path).await?;
    let index = from_bytes(&blob)?;

    debug!(path = ?path, count = index.len(), dimensions = index.dimensions(), "Loaded index");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_index() -> FlatIndex {
        FlatIndex::build(
            3,
            DistanceMetric::Euclidean,
            [[0.1f32, 0.2, 0.3], [1.0e-7, -0.0, 3.4e38], [-5.5, 0.0, 2.25]],
        )
        .unwrap()
    }

    #[test]
    fn test_blob_roundtrip_is_bit_exact() {
        let index = sample_index();
        let loaded = from_bytes(&to_bytes(&index).unwrap()).unwrap();

        assert_eq!(loaded.dimensions(), 3);
        assert_eq!(loaded.metric(), DistanceMetric::Euclidean);
        for (a, b) in index.iter().zip(loaded.iter()) {
            let a_bits: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
            let b_bits: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
        }
    }

    #[test]
    fn test_search_identical_after_roundtrip() {
        let index = sample_index();
        let loaded = from_bytes(&to_bytes(&index).unwrap()).unwrap();

        for query in [[0.0f32, 0.0, 0.0], [0.1, 0.2, 0.3], [-4.0, 1.0, 2.0]] {
            let before = index.search(&query, 3).unwrap();
            let after = loaded.search(&query, 3).unwrap();
            assert_eq!(before.len(), after.len());
            for (a, b) in before.iter().zip(&after) {
                assert_eq!(a.id, b.id);
                assert_eq!(a.distance.to_bits(), b.distance.to_bits());
            }
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(from_bytes(b"nope"), Err(Error::Persistence(_))));
        assert!(matches!(from_bytes(b"RLVX\xff"), Err(Error::Persistence(_))));
    }

    #[test]
    fn test_rejects_ragged_data() {
        let payload = PersistedIndexRef {
            version: FORMAT_VERSION,
            dimensions: 2,
            metric: DistanceMetric::Euclidean,
            data: &[1.0, 2.0, 3.0],
        };
        let mut blob = MAGIC.to_vec();
        blob.extend(postcard::to_allocvec(&payload).unwrap());

        assert!(matches!(from_bytes(&blob), Err(Error::Persistence(_))));
    }

    #[tokio::test]
    async fn test_save_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("index.bin");

        let index = sample_index();
        save_index(&path, &index).await.unwrap();
        let loaded = load_index(&path).await.unwrap();

        assert_eq!(loaded, index);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_index(temp_dir.path().join("missing.bin")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
