//! HTTP API over the transcript pipeline.
//!
//! Endpoints:
//! - `GET /` - service description
//! - `GET /health` - liveness probe
//! - `GET /transcript/:video_id` - flattened transcript
//! - `GET /video-info/:video_id` - metadata plus timestamped captions
//! - `GET /cookies/status` - cookie jar health

mod handlers;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::pipeline::TranscriptPipeline;

use handlers::{cookies_status, health, root, transcript, video_info};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TranscriptPipeline>,
    pub cookies_file: Option<PathBuf>,
}

/// Build the router with CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/transcript/:video_id", get(transcript))
        .route("/video-info/:video_id", get(video_info))
        .route("/cookies/status", get(cookies_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), anyhow::Error> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind server to {}: {}", addr, e))?;

    tracing::info!("Transcript API listening on http://{}/", addr);
    tracing::info!("  - Try: http://{}/transcript/dQw4w9WgXcQ", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
