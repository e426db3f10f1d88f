//! # ragline-vector
//!
//! An exact, in-process vector index for retrieval pipelines.
//!
//! ## Features
//!
//! - **Exact search**: linear-scan k-nearest-neighbor, no approximation
//! - **Deterministic ranking**: ascending distance, ties broken by ascending id
//! - **Positional ids**: the id of a vector is its position in the build batch
//! - **Bit-exact persistence**: a compact binary blob that round-trips every
//!   `f32` unchanged
//! - **Metric-agnostic**: squared L2 by default, cosine, dot product and L1
//!   available behind the same interface
//!
//! ## Quick Start
//!
//! ```rust
//! use ragline_vector::{DistanceMetric, FlatIndex};
//!
//! let index = FlatIndex::build(
//!     2,
//!     DistanceMetric::Euclidean,
//!     [[0.0f32, 0.0], [1.0, 0.0], [0.0, 2.0]],
//! )?;
//!
//! let hits = index.search(&[0.9, 0.0], 2)?;
//! assert_eq!(hits[0].id, 1);
//!
//! let restored = FlatIndex::load(&index.persist()?)?;
//! assert_eq!(restored.search(&[0.9, 0.0], 2)?, hits);
//! # Ok::<(), ragline_vector::Error>(())
//! ```
//!
//! ## Thread Safety
//!
//! A [`FlatIndex`] is immutable after [`FlatIndex::build`] or
//! [`FlatIndex::load`]; `search` takes `&self`, so an `Arc<FlatIndex>` can be
//! queried concurrently without locks. Adding incremental insertion would
//! require wrapping the storage in a read-shared / write-exclusive lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod index;
pub mod persistence;
pub mod types;

// Re-exports for convenience
pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use index::FlatIndex;
pub use persistence::{load_index, save_index};
pub use types::{SearchHit, VectorId};

impl FlatIndex {
    /// Serialize this index to an opaque, order-preserving byte blob.
    pub fn persist(&self) -> Result<Vec<u8>> {
        persistence::to_bytes(self)
    }

    /// Restore an index from a blob produced by [`FlatIndex::persist`].
    pub fn load(blob: &[u8]) -> Result<Self> {
        persistence::from_bytes(blob)
    }
}
