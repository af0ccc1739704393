use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use brain_rag::{
    ErrorKind, ExtractiveSynthesizer, HashingVectorizer, InMemoryFragmentStore, QueryRequest,
    RagError, RetrievalPipeline, Synthesizer, Vectorizer,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    config::ServerConfig,
    protocol::{AddRequest, AddResponse, ErrorPayload, QueryRequestBody, QueryResponse},
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RetrievalPipeline>,
}

impl AppState {
    pub fn new(pipeline: RetrievalPipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/add", post(add_note))
        .route("/api/query", post(query_notes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Wire concrete collaborators for `config`.
///
/// With the `openai` feature and `OPENAI_API_KEY` set, OpenAI embeddings and
/// chat completions are used. Otherwise everything runs offline with the
/// hashing vectorizer and the extractive synthesizer.
pub fn build_pipeline(config: &ServerConfig) -> anyhow::Result<RetrievalPipeline> {
    let (vectorizer, synthesizer) = collaborators()?;

    RetrievalPipeline::builder()
        .config(config.retrieval.clone())
        .vectorizer(vectorizer)
        .store(Arc::new(InMemoryFragmentStore::new()))
        .synthesizer(synthesizer)
        .build()
        .context("failed to build retrieval pipeline")
}

#[cfg(feature = "openai")]
fn collaborators() -> anyhow::Result<(Arc<dyn Vectorizer>, Arc<dyn Synthesizer>)> {
    use brain_rag::openai::{OpenAISynthesizer, OpenAIVectorizer};

    if std::env::var("OPENAI_API_KEY").is_ok_and(|key| !key.is_empty()) {
        info!("using OpenAI vectorizer and synthesizer");
        return Ok((
            Arc::new(OpenAIVectorizer::from_env()?),
            Arc::new(OpenAISynthesizer::from_env()?),
        ));
    }
    offline_collaborators()
}

#[cfg(not(feature = "openai"))]
fn collaborators() -> anyhow::Result<(Arc<dyn Vectorizer>, Arc<dyn Synthesizer>)> {
    offline_collaborators()
}

fn offline_collaborators() -> anyhow::Result<(Arc<dyn Vectorizer>, Arc<dyn Synthesizer>)> {
    info!("using offline hashing vectorizer and extractive synthesizer");
    Ok((Arc::new(HashingVectorizer::default()), Arc::new(ExtractiveSynthesizer)))
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(build_pipeline(&config)?);
    let pipeline = Arc::clone(&state.pipeline);
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for brain-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("brain-server listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    pipeline.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"brain-server"}))
}

async fn add_note(
    State(state): State<AppState>,
    payload: Result<Json<AddRequest>, JsonRejection>,
) -> Result<Json<AddResponse>, ApiError> {
    let Json(request) = payload?;
    let report = state.pipeline.add(request.into()).await?;
    Ok(Json(report.into()))
}

async fn query_notes(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequestBody>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(body) = payload?;
    let mut request = QueryRequest::new(body.question);
    if let Some(k) = body.k {
        request = request.with_k(k);
    }
    let answer = state.pipeline.query(request).await?;
    Ok(Json(answer.into()))
}

/// A request failure rendered as an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// The body could not be read as the expected JSON.
    Body(String),
    Rag(RagError),
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self::Rag(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        let err = match self {
            ApiError::Body(_) => return StatusCode::BAD_REQUEST,
            ApiError::Rag(err) => err,
        };
        match (err, err.kind()) {
            (_, ErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
            (RagError::PartialIngestion(_), _) => StatusCode::BAD_GATEWAY,
            (_, ErrorKind::DependencyUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            (_, ErrorKind::DimensionMismatch | ErrorKind::Configuration) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn payload(&self) -> ErrorPayload {
        match self {
            ApiError::Body(message) => ErrorPayload {
                error: message.clone(),
                stage: None,
                document_id: None,
                fragments_stored: None,
                fragments_failed: None,
            },
            ApiError::Rag(err) => ErrorPayload::from(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = self.payload();
        if status.is_server_error() {
            warn!(%status, error = %payload.error, "request failed");
        }
        (status, Json(payload)).into_response()
    }
}
