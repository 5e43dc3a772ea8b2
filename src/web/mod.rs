// Web server: Axum JSON API in front of the trend pipeline.
//
// The page that renders a report lives elsewhere; this server only exposes
// the pipeline over HTTP and maps its failures to status codes.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::pipeline::trends::TrendPipeline;

pub mod cache;
pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TrendPipeline>,
    pub cache: Arc<cache::ReportCache>,
}

impl AppState {
    pub fn new(pipeline: TrendPipeline, cache: cache::ReportCache) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            cache: Arc::new(cache),
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: &Config, pipeline: TrendPipeline) -> Result<()> {
    let state = AppState::new(pipeline, cache::ReportCache::new(config.cache_ttl));
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    info!("Trend extractor listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/trends", get(handlers::trends::get_trends))
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check: always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

async fn not_found() -> Response {
    api_error(StatusCode::NOT_FOUND, "Not found")
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
