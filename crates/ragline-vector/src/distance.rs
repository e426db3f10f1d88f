//! Distance metrics for vector comparison.
//!
//! Every metric is exposed as a *distance*: lower values mean closer vectors,
//! so the index can rank all of them with a single ascending sort.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance metric used by a [`FlatIndex`](crate::FlatIndex).
///
/// - **Euclidean**: squared L2, the default. Matches the classic flat L2
///   index used for sentence embeddings; no square root is taken.
/// - **Cosine**: `1 - cos(a, b)`, useful when only direction matters.
/// - **DotProduct**: negated inner product, for pre-normalized vectors.
/// - **Manhattan**: L1, sum of absolute differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Squared Euclidean (L2) distance. Range: [0, ∞).
    #[default]
    Euclidean,

    /// Cosine distance. Range: [0, 2].
    Cosine,

    /// Negated dot product. Range: (-∞, ∞).
    DotProduct,

    /// Manhattan (L1) distance. Range: [0, ∞).
    Manhattan,
}

impl DistanceMetric {
    /// Compute the distance between two vectors of equal length.
    ///
    /// Callers are responsible for checking dimensions; the index does so
    /// before any distance is computed.
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            DistanceMetric::Euclidean => squared_euclidean(a, b),
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
            DistanceMetric::DotProduct => -dot_product(a, b),
            DistanceMetric::Manhattan => manhattan(a, b),
        }
    }

    /// Get the name of this distance metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::DotProduct => "dot_product",
            DistanceMetric::Manhattan => "manhattan",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "euclidean" | "l2" | "squared_l2" => Ok(DistanceMetric::Euclidean),
            "cosine" | "cos" => Ok(DistanceMetric::Cosine),
            "dot" | "dot_product" | "inner" => Ok(DistanceMetric::DotProduct),
            "manhattan" | "l1" => Ok(DistanceMetric::Manhattan),
            _ => Err(format!("Unknown distance metric: {}", s)),
        }
    }
}

#[inline]
fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn manhattan(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// Cosine similarity in [-1, 1]; zero vectors compare as orthogonal.
#[inline]
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = dot_product(a, a);
    let norm_b = dot_product(b, b);

    let denom = (norm_a * norm_b).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
