//! Retrieval pipeline orchestrator.
//!
//! The [`RetrievalPipeline`] coordinates ingestion (store document → fragment
//! → embed → store fragments) and querying (embed → scan → rank → assemble →
//! synthesize) over injected [`Vectorizer`], [`FragmentStore`], and
//! [`Synthesizer`] collaborators.
//!
//! # Example
//!
//! ```rust,ignore
//! use brain_rag::{
//!     ExtractiveSynthesizer, HashingVectorizer, InMemoryFragmentStore, NewDocument,
//!     QueryRequest, RetrievalConfig, RetrievalPipeline,
//! };
//!
//! let pipeline = RetrievalPipeline::builder()
//!     .config(RetrievalConfig::default())
//!     .vectorizer(Arc::new(HashingVectorizer::default()))
//!     .store(Arc::new(InMemoryFragmentStore::new()))
//!     .synthesizer(Arc::new(ExtractiveSynthesizer))
//!     .build()?;
//!
//! let report = pipeline.add(NewDocument::new("Paris is the capital of France.")).await?;
//! let answer = pipeline.query(QueryRequest::new("What is the capital of France?")).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::RetrievalConfig;
use crate::context::{ContextAssembler, SYSTEM_PROMPT, build_user_prompt};
use crate::document::{
    Document, FragmentFailure, IngestReport, NewDocument, QueryAnswer, RetrievalResult,
};
use crate::embedding::Vectorizer;
use crate::error::{RagError, Result, Stage};
use crate::fragmenter::Fragmenter;
use crate::ranker::{BruteForceRanker, Ranker};
use crate::store::FragmentStore;
use crate::synthesis::Synthesizer;

/// A question to answer from stored notes.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// The natural-language question.
    pub question: String,
    /// Number of fragments to retrieve; the configured `top_k` when `None`.
    pub k: Option<usize>,
    /// Point in time after which external calls are abandoned.
    pub deadline: Option<Instant>,
}

impl QueryRequest {
    /// A request with the default `k` and no deadline.
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: question.into(), k: None, deadline: None }
    }

    /// Retrieve `k` fragments instead of the configured default.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    /// Abandon the request once `deadline` passes.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// The retrieval pipeline orchestrator.
///
/// Holds no per-request state; share it behind an `Arc` across concurrent
/// requests. Construct one via [`RetrievalPipeline::builder()`] and call
/// [`shutdown()`](RetrievalPipeline::shutdown) when done.
pub struct RetrievalPipeline {
    config: RetrievalConfig,
    vectorizer: Arc<dyn Vectorizer>,
    store: Arc<dyn FragmentStore>,
    synthesizer: Arc<dyn Synthesizer>,
    ranker: Arc<dyn Ranker>,
    fragmenter: Fragmenter,
    assembler: ContextAssembler,
}

impl RetrievalPipeline {
    /// Create a new [`RetrievalPipelineBuilder`].
    pub fn builder() -> RetrievalPipelineBuilder {
        RetrievalPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Return a reference to the vectorizer.
    pub fn vectorizer(&self) -> &Arc<dyn Vectorizer> {
        &self.vectorizer
    }

    /// Return a reference to the fragment store.
    pub fn store(&self) -> &Arc<dyn FragmentStore> {
        &self.store
    }

    /// Store a note: persist document → fragment → embed → persist fragments.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if the text is empty or whitespace-only;
    ///   nothing is stored.
    /// - [`RagError::DependencyUnavailable`] / [`RagError::DeadlineExceeded`]
    ///   if the document itself cannot be stored.
    /// - [`RagError::PartialIngestion`] if the document was stored but one or
    ///   more fragments were not. The document is not rolled back.
    pub async fn add(&self, input: NewDocument) -> Result<IngestReport> {
        self.add_with_deadline(input, None).await
    }

    /// [`add`](Self::add) with an optional deadline bounding every external call.
    pub async fn add_with_deadline(
        &self,
        input: NewDocument,
        deadline: Option<Instant>,
    ) -> Result<IngestReport> {
        if input.text.trim().is_empty() {
            return Err(RagError::invalid_input(Stage::Ingestion, "text must not be empty"));
        }

        // Received
        let document = Document::from_new(input);
        let document_id = self
            .call(Stage::Storing, deadline, self.store.insert_document(&document))
            .await
            .inspect_err(|e| error!(error = %e, "failed to store document"))?;

        // Fragmented
        let fragments = self.fragmenter.fragment_document(&document);
        let fragments_total = fragments.len();
        if fragments.is_empty() {
            info!(document.id = %document_id, fragments_total, "ingested document (no fragments)");
            return Ok(IngestReport {
                document_id,
                fragments_total,
                fragments_stored: 0,
                failures: Vec::new(),
            });
        }

        // Vectorized. `buffered` keeps results in sequence order. The calls are
        // collected first so no borrowing closure lives across the await.
        let calls: Vec<_> = fragments
            .iter()
            .map(|fragment| self.embed_checked(&fragment.text, deadline))
            .collect();
        let embeddings: Vec<Result<Vec<f32>>> =
            stream::iter(calls).buffered(self.config.max_concurrency).collect().await;

        let mut failures = Vec::new();
        let mut ready = Vec::with_capacity(fragments_total);
        for (mut fragment, embedding) in fragments.into_iter().zip(embeddings) {
            match embedding {
                Ok(embedding) => {
                    fragment.embedding = embedding;
                    ready.push(fragment);
                }
                Err(e) => {
                    warn!(
                        document.id = %document_id,
                        fragment.sequence = fragment.sequence,
                        error = %e,
                        "fragment vectorization failed"
                    );
                    failures.push(FragmentFailure { sequence: fragment.sequence, error: e.to_string() });
                }
            }
        }

        // Stored
        let mut fragments_stored = 0;
        if !ready.is_empty() {
            match self.call(Stage::Storing, deadline, self.store.insert_fragments(&ready)).await {
                Ok(()) => fragments_stored = ready.len(),
                Err(e) => {
                    error!(document.id = %document_id, error = %e, "failed to store fragments");
                    let message = e.to_string();
                    failures.extend(
                        ready
                            .iter()
                            .map(|f| FragmentFailure { sequence: f.sequence, error: message.clone() }),
                    );
                    failures.sort_by_key(|f| f.sequence);
                }
            }
        }

        let report = IngestReport { document_id, fragments_total, fragments_stored, failures };

        if report.is_complete() {
            info!(document.id = %report.document_id, fragments_total, "ingested document");
            Ok(report)
        } else {
            warn!(
                document.id = %report.document_id,
                fragments_total,
                fragments_stored = report.fragments_stored,
                fragments_failed = report.fragments_failed(),
                "ingested document partially"
            );
            Err(RagError::PartialIngestion(report))
        }
    }

    /// Embed → scan → rank → assemble, without synthesis.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if the question is empty or `k` is zero.
    /// - [`RagError::DependencyUnavailable`] / [`RagError::DeadlineExceeded`]
    ///   if the vectorizer or store fails.
    pub async fn retrieve(&self, request: &QueryRequest) -> Result<RetrievalResult> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(RagError::invalid_input(Stage::Query, "question must not be empty"));
        }
        let k = request.k.unwrap_or(self.config.top_k);
        if k == 0 {
            return Err(RagError::invalid_input(Stage::Query, "k must be greater than zero"));
        }

        let query_vector = self
            .embed_checked(question, request.deadline)
            .await
            .inspect_err(|e| error!(error = %e, "query embedding failed"))?;

        let candidates = self
            .call(Stage::Ranking, request.deadline, self.store.scan_fragments())
            .await
            .inspect_err(|e| error!(error = %e, "fragment scan failed"))?;

        let scored = self.ranker.rank(&query_vector, &candidates, k);
        let context = self.assembler.assemble(&scored, question);

        info!(
            candidate_count = candidates.len(),
            result_count = scored.len(),
            k,
            "retrieval completed"
        );

        Ok(RetrievalResult { scored, context })
    }

    /// Answer a question from stored notes.
    ///
    /// An empty corpus is not an error: the synthesizer is still called with
    /// an empty context and `sources` is empty.
    ///
    /// # Errors
    ///
    /// Any stage failure aborts the request; no partial answer is returned.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryAnswer> {
        let retrieval = self.retrieve(&request).await?;
        let user_prompt = build_user_prompt(request.question.trim(), &retrieval.context);

        let answer = self
            .call(
                Stage::Synthesizing,
                request.deadline,
                self.synthesizer.generate(SYSTEM_PROMPT, &user_prompt),
            )
            .await
            .inspect_err(|e| error!(error = %e, "answer synthesis failed"))?;

        info!(source_count = retrieval.context.sources.len(), "query completed");

        Ok(QueryAnswer { answer, sources: retrieval.context.sources })
    }

    /// Release collaborator resources.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DependencyUnavailable`] if the store fails to close.
    pub async fn shutdown(&self) -> Result<()> {
        self.store.close().await.map_err(|e| RagError::unavailable(Stage::Storing, e.to_string()))?;
        info!("retrieval pipeline shut down");
        Ok(())
    }

    /// Embed `text` and check the vector against the declared dimensionality.
    async fn embed_checked(&self, text: &str, deadline: Option<Instant>) -> Result<Vec<f32>> {
        let embedding = self.call(Stage::Vectorizing, deadline, self.vectorizer.embed(text)).await?;
        let expected = self.vectorizer.dimensions();
        if embedding.len() != expected {
            return Err(RagError::unavailable(
                Stage::Vectorizing,
                RagError::DimensionMismatch { expected, actual: embedding.len() }.to_string(),
            ));
        }
        Ok(embedding)
    }

    /// Time budget for one external call: the configured timeout, shortened
    /// to whatever is left before `deadline`.
    fn budget(&self, deadline: Option<Instant>) -> Duration {
        let timeout = self.config.call_timeout();
        match deadline {
            Some(deadline) => timeout.min(deadline.saturating_duration_since(Instant::now())),
            None => timeout,
        }
    }

    /// Run an external call under the time budget and tag failures with `stage`.
    async fn call<T, F>(&self, stage: Stage, deadline: Option<Instant>, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let budget = self.budget(deadline);
        match tokio::time::timeout(budget, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(RagError::unavailable(stage, e.to_string())),
            Err(_) => Err(RagError::DeadlineExceeded {
                stage,
                elapsed_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// Builder for constructing a [`RetrievalPipeline`].
///
/// `vectorizer`, `store`, and `synthesizer` are required. `config` defaults
/// to [`RetrievalConfig::default()`] and `ranker` to [`BruteForceRanker`].
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RetrievalPipeline::builder()
///     .config(RetrievalConfig::default())
///     .vectorizer(Arc::new(vectorizer))
///     .store(Arc::new(store))
///     .synthesizer(Arc::new(synthesizer))
///     .ranker(Arc::new(ranker))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RetrievalPipelineBuilder {
    config: Option<RetrievalConfig>,
    vectorizer: Option<Arc<dyn Vectorizer>>,
    store: Option<Arc<dyn FragmentStore>>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    ranker: Option<Arc<dyn Ranker>>,
}

impl RetrievalPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the vectorizer.
    pub fn vectorizer(mut self, vectorizer: Arc<dyn Vectorizer>) -> Self {
        self.vectorizer = Some(vectorizer);
        self
    }

    /// Set the fragment store backend.
    pub fn store(mut self, store: Arc<dyn FragmentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the answer synthesizer.
    pub fn synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Replace the default [`BruteForceRanker`].
    pub fn ranker(mut self, ranker: Arc<dyn Ranker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    /// Build the [`RetrievalPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<RetrievalPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let vectorizer = self
            .vectorizer
            .ok_or_else(|| RagError::Config("vectorizer is required".to_string()))?;
        let store = self.store.ok_or_else(|| RagError::Config("store is required".to_string()))?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| RagError::Config("synthesizer is required".to_string()))?;

        Ok(RetrievalPipeline {
            fragmenter: Fragmenter::new(config.fragment_size),
            assembler: ContextAssembler::with_max_chars(config.max_context_chars),
            ranker: self.ranker.unwrap_or_else(|| Arc::new(BruteForceRanker)),
            config,
            vectorizer,
            store,
            synthesizer,
        })
    }
}
