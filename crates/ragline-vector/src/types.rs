//! Common types for ragline-vector.

use serde::{Deserialize, Serialize};

/// Positional identifier of a vector inside an index.
///
/// Ids are assigned in insertion order starting at 0, so the id of a vector
/// is also the position of the record it was computed from.
pub type VectorId = usize;

/// One ranked result of a nearest-neighbor search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Id of the matched vector.
    pub id: VectorId,
    /// Distance to the query (lower = closer).
    pub distance: f32,
}

impl SearchHit {
    /// Create a new search hit.
    pub fn new(id: VectorId, distance: f32) -> Self {
        Self { id, distance }
    }
}
