//! Vectorizer trait for turning text into fixed-length vectors.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RagError, Result};

/// A provider that maps text to an embedding vector.
///
/// Implementations must return vectors of the same length,
/// [`dimensions()`](Vectorizer::dimensions), for the lifetime of a corpus;
/// mixing dimensionalities makes stored fragments unrankable.
///
/// # Example
///
/// ```rust,ignore
/// use brain_rag::Vectorizer;
///
/// let vectorizer = MyVectorizer::new();
/// let embedding = vectorizer.embed("hello world").await?;
/// assert_eq!(embedding.len(), vectorizer.dimensions());
/// ```
#[async_trait]
pub trait Vectorizer: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Default dimensionality for [`HashingVectorizer`].
pub const DEFAULT_HASHING_DIMENSIONS: usize = 1024;

/// A deterministic bag-of-words vectorizer that needs no network access.
///
/// Text is lowercased and split into alphanumeric tokens; each token is
/// hashed with FNV-1a into one of `dimensions` buckets and the resulting
/// count vector is L2-normalized. Texts sharing vocabulary score higher under
/// cosine similarity, which is enough for offline use and tests.
#[derive(Debug, Clone, Copy)]
pub struct HashingVectorizer {
    dimensions: usize,
}

impl Default for HashingVectorizer {
    fn default() -> Self {
        Self { dimensions: DEFAULT_HASHING_DIMENSIONS }
    }
}

impl HashingVectorizer {
    /// Create a vectorizer producing vectors of length `dimensions`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::Config("hashing vectorizer needs at least one dimension".into()));
        }
        Ok(Self { dimensions })
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = token
            .bytes()
            .fold(FNV_OFFSET, |acc, b| (acc ^ u64::from(b)).wrapping_mul(FNV_PRIME));
        (hash % self.dimensions as u64) as usize
    }

    /// Compute the embedding synchronously.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            vector[self.bucket(token)] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl Vectorizer for HashingVectorizer {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Hashing", text_len = text.len(), "embedding text");
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::cosine_similarity;

    #[tokio::test]
    async fn vectors_have_declared_dimensions() {
        let vectorizer = HashingVectorizer::new(64).unwrap();
        let v = vectorizer.embed("Rust is fast").await.unwrap();
        assert_eq!(v.len(), 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_the_zero_vector() {
        let v = HashingVectorizer::default().embed_sync("  ...  ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        let vectorizer = HashingVectorizer::default();
        assert_eq!(vectorizer.embed_sync("Hello, World!"), vectorizer.embed_sync("hello world"));
    }

    #[test]
    fn shared_vocabulary_scores_higher() {
        let vectorizer = HashingVectorizer::default();
        let q = vectorizer.embed_sync("capital of France");
        let near = vectorizer.embed_sync("Paris is the capital of France.");
        let far = vectorizer.embed_sync("Bananas are yellow.");
        let near_score = cosine_similarity(&q, &near).unwrap();
        let far_score = cosine_similarity(&q, &far).unwrap();
        assert!(near_score > far_score);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(HashingVectorizer::new(0), Err(RagError::Config(_))));
    }
}
