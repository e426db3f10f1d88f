//! Exact flat index.
//!
//! Vectors are stored contiguously in insertion order and searched with a
//! linear scan. The index is built once and is read-only afterwards, so it
//! can be shared behind an `Arc` and searched from any number of threads
//! without locking.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::types::{SearchHit, VectorId};
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Exact k-nearest-neighbor index over fixed-dimension vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    /// Vector dimensions.
    dimensions: usize,
    /// Distance metric.
    metric: DistanceMetric,
    /// Row-major vector storage; row `i` is the vector with id `i`.
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build an index from an ordered batch of vectors.
    ///
    /// Ids are assigned positionally. Every vector must have `dimensions`
    /// components and contain only finite values; the first offending vector
    /// aborts the build and nothing is returned.
    ///
    /// # Arguments
    ///
    /// * `dimensions` - Dimensionality of every vector.
    /// * `metric` - Distance metric used by [`search`](Self::search).
    /// * `vectors` - The vectors, in id order.
    pub fn build<I, V>(dimensions: usize, metric: DistanceMetric, vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[f32]>,
    {
        if dimensions == 0 {
            return Err(Error::InvalidVector("Dimensions must be > 0".to_string()));
        }

        let vectors = vectors.into_iter();
        let mut data = Vec::with_capacity(vectors.size_hint().0 * dimensions);

        for (id, vector) in vectors.enumerate() {
            let vector = vector.as_ref();
            validate(dimensions, vector, Some(id))?;
            data.extend_from_slice(vector);
        }

        let index = Self {
            dimensions,
            metric,
            data,
        };
        debug!(
            count = index.len(),
            dimensions,
            metric = %metric,
            "Built flat index"
        );
        Ok(index)
    }

    /// Build an index, inferring the dimensionality from the first vector.
    ///
    /// # Errors
    ///
    /// An empty batch carries no dimensionality and is rejected with
    /// [`Error::InvalidVector`]; use [`build`](Self::build) when the
    /// dimensions are known up front.
    pub fn from_vectors<V: AsRef<[f32]>>(vectors: &[V], metric: DistanceMetric) -> Result<Self> {
        let dimensions = vectors
            .first()
            .map(|v| v.as_ref().len())
            .ok_or_else(|| {
                Error::InvalidVector("Cannot infer dimensions from an empty batch".to_string())
            })?;
        Self::build(dimensions, metric, vectors)
    }

    /// Reassemble an index from raw row-major storage.
    pub(crate) fn from_raw(dimensions: usize, metric: DistanceMetric, data: Vec<f32>) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidVector("Dimensions must be > 0".to_string()));
        }
        if data.len() % dimensions != 0 {
            return Err(Error::Persistence(format!(
                "Vector data length {} is not a multiple of {} dimensions",
                data.len(),
                dimensions
            )));
        }
        Ok(Self {
            dimensions,
            metric,
            data,
        })
    }

    /// Get the vector dimensions.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Get the distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Get the number of vectors in the index.
    pub fn len(&self) -> usize {
        self.data.len() / self.dimensions
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a vector by id.
    pub fn vector(&self, id: VectorId) -> Option<&[f32]> {
        let start = id.checked_mul(self.dimensions)?;
        self.data.get(start..start + self.dimensions)
    }

    /// Iterate over all vectors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimensions)
    }

    /// Raw row-major storage.
    pub(crate) fn raw(&self) -> &[f32] {
        &self.data
    }

    /// Search for the `k` nearest vectors to `query`.
    ///
    /// Returns `min(k, len)` hits sorted by ascending distance, ties broken
    /// by ascending id.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        validate(self.dimensions, query, None)?;

        let mut hits: Vec<SearchHit> = self
            .iter()
            .enumerate()
            .map(|(id, vector)| SearchHit::new(id, self.metric.distance(query, vector)))
            .collect();

        let k = k.min(hits.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        // Partition so the k best are in front, then order only those.
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, rank);
            hits.truncate(k);
        }
        hits.sort_unstable_by(rank);

        trace!(k, best = ?hits.first(), "Searched flat index");
        Ok(hits)
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

fn rank(a: &SearchHit, b: &SearchHit) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.id.cmp(&b.id))
}

fn validate(dimensions: usize, vector: &[f32], id: Option<VectorId>) -> Result<()> {
    if vector.len() != dimensions {
        return Err(Error::DimensionMismatch {
            expected: dimensions,
            actual: vector.len(),
        });
    }

    if vector.iter().any(|v| !v.is_finite()) {
        let what = match id {
            Some(id) => format!("Vector {} contains NaN or Inf", id),
            None => "Query contains NaN or Inf".to_string(),
        };
        return Err(Error::InvalidVector(what));
    }

    Ok(())
}
