//! Similarity ranking of stored fragments against a query vector.
//!
//! [`BruteForceRanker`] scores every candidate exactly once and keeps the
//! top `k`. It is the correctness baseline for any indexed [`Ranker`].

use std::cmp::Ordering;

use tracing::warn;

use crate::document::{Fragment, ScoredFragment};
use crate::error::{RagError, Result};

/// Default number of fragments returned per query.
pub const DEFAULT_TOP_K: usize = 6;

/// Added to the norm product so all-zero vectors score 0 instead of NaN.
pub const COSINE_EPSILON: f32 = 1e-10;

/// Compute cosine similarity between two vectors.
///
/// `dot(a, b) / (|a| * |b| + ε)`. The result lies in `[-1, 1]`.
///
/// # Errors
///
/// Returns [`RagError::DimensionMismatch`] if the vectors differ in length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(RagError::DimensionMismatch { expected: a.len(), actual: b.len() });
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    Ok(dot / (norm_a * norm_b + COSINE_EPSILON))
}

/// Selects the fragments most similar to a query vector.
pub trait Ranker: Send + Sync {
    /// Return at most `k` scored copies of `candidates`, best first.
    ///
    /// Equal scores keep their relative input order. Candidates whose
    /// dimensionality differs from `query` are skipped.
    fn rank(&self, query: &[f32], candidates: &[Fragment], k: usize) -> Vec<ScoredFragment>;
}

/// Exhaustive cosine-similarity ranker.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceRanker;

impl Ranker for BruteForceRanker {
    fn rank(&self, query: &[f32], candidates: &[Fragment], k: usize) -> Vec<ScoredFragment> {
        let mut scored: Vec<(usize, f32)> = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            match cosine_similarity(query, &candidate.embedding) {
                Ok(score) if score.is_finite() => scored.push((index, score)),
                Ok(score) => {
                    warn!(fragment.id = %candidate.id, score, "skipping candidate with non-finite score");
                }
                Err(e) => {
                    warn!(fragment.id = %candidate.id, error = %e, "skipping candidate");
                }
            }
        }

        // `sort_by` is stable, so ties stay in candidate order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(index, score)| ScoredFragment { fragment: candidates[index].clone(), score })
            .collect()
    }
}

/// Rank with the [`BruteForceRanker`].
pub fn rank(query: &[f32], candidates: &[Fragment], k: usize) -> Vec<ScoredFragment> {
    BruteForceRanker.rank(query, candidates, k)
}
