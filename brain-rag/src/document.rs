//! Data types for documents, fragments, and retrieval results.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller input for a note to be remembered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewDocument {
    /// The free-form text of the note.
    pub text: String,
    /// Optional URL the note was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Optional tag naming where the note was captured (e.g. `mobile`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl NewDocument {
    /// A note with text only.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), url: None, source: None }
    }

    /// Attach an origin URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach a source tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A stored note. Never updated once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Optional URL pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Optional capture source tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// When the document was received.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Mint a document with a fresh v4 id from caller input.
    pub fn from_new(input: NewDocument) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: input.text,
            url: input.url,
            source: input.source,
            created_at: Utc::now(),
        }
    }
}

/// A word-preserving slice of a [`Document`] with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fragment {
    /// Unique identifier, `{document_id}_{sequence}`.
    pub id: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Zero-based position of this fragment inside its document.
    pub sequence: usize,
    /// The text content of the fragment.
    pub text: String,
    /// The vector embedding for this fragment's text.
    pub embedding: Vec<f32>,
    /// When the fragment was created.
    pub created_at: DateTime<Utc>,
}

/// A [`Fragment`] paired with its similarity to a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredFragment {
    /// The retrieved fragment.
    pub fragment: Fragment,
    /// Cosine similarity to the query vector (higher is more relevant).
    pub score: f32,
}

/// Provenance for one fragment used to answer a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    /// Owning document.
    pub document_id: String,
    /// Full fragment text.
    pub snippet: String,
    /// Similarity score of the fragment.
    pub score: f32,
}

/// Context prepared for the synthesizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssembledContext {
    /// Numbered, attributed blocks in rank order.
    pub context_text: String,
    /// One entry per block, same order.
    pub sources: Vec<Source>,
}

/// Top-K fragments for a question and the context built from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub scored: Vec<ScoredFragment>,
    pub context: AssembledContext,
}

/// A synthesized answer with its sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// A fragment that could not be vectorized or stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FragmentFailure {
    /// Position of the fragment inside its document.
    pub sequence: usize,
    /// Rendered error.
    pub error: String,
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestReport {
    pub document_id: String,
    pub fragments_total: usize,
    pub fragments_stored: usize,
    pub failures: Vec<FragmentFailure>,
}

impl IngestReport {
    /// Whether every fragment of the document was stored.
    pub fn is_complete(&self) -> bool {
        self.fragments_stored == self.fragments_total
    }

    /// Number of fragments that were not stored.
    pub fn fragments_failed(&self) -> usize {
        self.fragments_total - self.fragments_stored
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "document '{}': {} of {} fragments stored",
            self.document_id, self.fragments_stored, self.fragments_total
        )
    }
}
