//! HTTP surface: static page, synchronous upload, streaming analysis, CSV export.

pub mod error;
pub mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::analysis::AnalysisPipeline;
use crate::config::Config;
use crate::error::Result;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub stream_capacity: usize,
}

pub fn router(state: AppState, static_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/upload", post(handlers::upload))
        .route("/stream-analysis", post(handlers::stream_analysis))
        .route("/export", post(handlers::export))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `config.bind_addr` and serves until Ctrl-C.
pub async fn serve(config: &Config, pipeline: AnalysisPipeline) -> Result<()> {
    let state = AppState {
        pipeline: Arc::new(pipeline),
        stream_capacity: config.stream_channel_capacity,
    };
    let app = router(state, &config.static_dir, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Risk analysis server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
