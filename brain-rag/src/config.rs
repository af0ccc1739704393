//! Configuration for the retrieval pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::fragmenter::DEFAULT_FRAGMENT_SIZE;
use crate::ranker::DEFAULT_TOP_K;

/// Default number of fragments vectorized concurrently during ingestion.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default time budget for a single external call, in milliseconds.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

/// Configuration parameters for the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Target fragment length in characters.
    pub fragment_size: usize,
    /// Number of fragments returned when the caller does not ask for a specific `k`.
    pub top_k: usize,
    /// Upper bound on concurrent vectorizer calls while ingesting one document.
    pub max_concurrency: usize,
    /// Time budget for each vectorizer, store, or synthesizer call.
    pub call_timeout_ms: u64,
    /// Optional cap on the assembled context length in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_context_chars: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            top_k: DEFAULT_TOP_K,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            max_context_chars: None,
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }

    /// The per-call timeout as a [`Duration`].
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Check that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any count or timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.fragment_size == 0 {
            return Err(RagError::Config("fragment_size must be greater than zero".to_string()));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(RagError::Config("max_concurrency must be greater than zero".to_string()));
        }
        if self.call_timeout_ms == 0 {
            return Err(RagError::Config("call_timeout_ms must be greater than zero".to_string()));
        }
        if self.max_context_chars == Some(0) {
            return Err(RagError::Config(
                "max_context_chars must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the target fragment size in characters.
    pub fn fragment_size(mut self, size: usize) -> Self {
        self.config.fragment_size = size;
        self
    }

    /// Set the default number of fragments retrieved per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the vectorization concurrency bound.
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.config.max_concurrency = n;
        self
    }

    /// Set the per-call timeout.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Cap the assembled context length.
    pub fn max_context_chars(mut self, chars: usize) -> Self {
        self.config.max_context_chars = Some(chars);
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any count or timeout is zero.
    pub fn build(self) -> Result<RetrievalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
