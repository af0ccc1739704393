//! Error types for the `brain-rag` crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::IngestReport;

/// The pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingestion,
    Query,
    Fragmenting,
    Vectorizing,
    Storing,
    Ranking,
    Assembling,
    Synthesizing,
}

impl Stage {
    /// The lowercase stage name used in logs and error payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Ingestion => "ingestion",
            Stage::Query => "query",
            Stage::Fragmenting => "fragmenting",
            Stage::Vectorizing => "vectorizing",
            Stage::Storing => "storing",
            Stage::Ranking => "ranking",
            Stage::Assembling => "assembling",
            Stage::Synthesizing => "synthesizing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`RagError`].
///
/// `InvalidInput` is permanent: retrying the same request fails the same way.
/// `DependencyUnavailable` is transient from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    DependencyUnavailable,
    DimensionMismatch,
    Configuration,
}

/// Errors that can occur in retrieval operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The request was rejected before any external call was made.
    #[error("invalid input ({stage}): {message}")]
    InvalidInput {
        /// Stage that rejected the input.
        stage: Stage,
        /// What was wrong with it.
        message: String,
    },

    /// A store, vectorizer or synthesizer call failed.
    #[error("dependency unavailable ({stage}): {message}")]
    DependencyUnavailable {
        /// Stage whose external call failed.
        stage: Stage,
        /// A description of the failure.
        message: String,
    },

    /// An external call did not finish within its time budget.
    #[error("deadline exceeded ({stage}) after {elapsed_ms}ms")]
    DeadlineExceeded {
        /// Stage whose external call timed out.
        stage: Stage,
        /// The budget that was granted to the call.
        elapsed_ms: u64,
    },

    /// The document was stored but some of its fragments were not.
    #[error("partial ingestion of {0}")]
    PartialIngestion(IngestReport),

    /// Two vectors that should share a dimensionality do not.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the reference vector.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// An error raised by a vectorizer implementation.
    #[error("vectorizer error ({provider}): {message}")]
    Vectorizer {
        /// The vectorizer that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error raised by a fragment store implementation.
    #[error("store error ({backend}): {message}")]
    Store {
        /// The store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error raised by a synthesizer implementation.
    #[error("synthesizer error ({provider}): {message}")]
    Synthesizer {
        /// The synthesizer that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RagError {
    pub(crate) fn invalid_input(stage: Stage, message: impl Into<String>) -> Self {
        RagError::InvalidInput { stage, message: message.into() }
    }

    pub(crate) fn unavailable(stage: Stage, message: impl Into<String>) -> Self {
        RagError::DependencyUnavailable { stage, message: message.into() }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::InvalidInput { .. } => ErrorKind::InvalidInput,
            RagError::DependencyUnavailable { .. }
            | RagError::DeadlineExceeded { .. }
            | RagError::PartialIngestion(_)
            | RagError::Vectorizer { .. }
            | RagError::Store { .. }
            | RagError::Synthesizer { .. } => ErrorKind::DependencyUnavailable,
            RagError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            RagError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// The stage this error was raised in, when known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RagError::InvalidInput { stage, .. }
            | RagError::DependencyUnavailable { stage, .. }
            | RagError::DeadlineExceeded { stage, .. } => Some(*stage),
            RagError::PartialIngestion(_) => Some(Stage::Ingestion),
            RagError::Vectorizer { .. } => Some(Stage::Vectorizing),
            RagError::Store { .. } => Some(Stage::Storing),
            RagError::Synthesizer { .. } => Some(Stage::Synthesizing),
            RagError::DimensionMismatch { .. } | RagError::Config(_) => None,
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::DependencyUnavailable
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
