//! # brain-rag
//!
//! Retrieval pipeline for a personal "second brain": notes are split into
//! word-preserving fragments, embedded, and stored; questions are embedded,
//! matched against every stored fragment by cosine similarity, and answered
//! from a numbered, attributed context.
//!
//! ## Overview
//!
//! - [`fragmenter`] - whitespace-token fragmentation with a target size
//! - [`Vectorizer`] - text → fixed-length vector (external capability)
//! - [`FragmentStore`] - document and fragment persistence (external collaborator)
//! - [`ranker`] - cosine scoring and stable top-K selection
//! - [`context`] - context assembly with provenance
//! - [`Synthesizer`] - prompt → answer text (external capability)
//! - [`RetrievalPipeline`] - ingestion and query orchestration
//!
//! ## Features
//!
//! - `openai` - [`openai::OpenAIVectorizer`] and [`openai::OpenAISynthesizer`]

pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fragmenter;
pub mod pipeline;
pub mod ranker;
pub mod store;
pub mod synthesis;

#[cfg(feature = "openai")]
pub mod openai;

pub use config::{RetrievalConfig, RetrievalConfigBuilder};
pub use context::{ContextAssembler, SYSTEM_PROMPT, assemble, build_user_prompt};
pub use document::{
    AssembledContext, Document, Fragment, FragmentFailure, IngestReport, NewDocument, QueryAnswer,
    RetrievalResult, ScoredFragment, Source,
};
pub use embedding::{HashingVectorizer, Vectorizer};
pub use error::{ErrorKind, RagError, Result, Stage};
pub use fragmenter::{Fragmenter, fragment};
pub use pipeline::{QueryRequest, RetrievalPipeline, RetrievalPipelineBuilder};
pub use ranker::{BruteForceRanker, Ranker, cosine_similarity, rank};
pub use store::{FragmentStore, InMemoryFragmentStore};
pub use synthesis::{ExtractiveSynthesizer, Synthesizer};
