//! `brain-server` exposes a [`brain_rag::RetrievalPipeline`] over HTTP.
//! Notes are posted to `/api/add` and questions to `/api/query`.

pub mod config;
pub mod protocol;
pub mod server;
pub mod telemetry;

pub use config::ServerConfig;
pub use server::{AppState, app_router, build_pipeline, run_server};
