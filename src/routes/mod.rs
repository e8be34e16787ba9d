//! API Routes
//!
//! - `POST /classify_file` - batch classification of uploaded documents
//! - `GET /labels` - active candidate label set
//! - `GET /health` - liveness and pipeline summary

pub mod classify;
pub mod health;
pub mod labels;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::middleware::cors_layer;
use crate::models::AppState;
use crate::types::panic_response;

/// Create the application router with tracing, CORS and the request body limit.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let config = state.config.clone();
    let router = Router::new()
        .merge(classify::router(state.clone()))
        .merge(labels::router(state.clone()))
        .merge(health::router(state));

    apply_layers(router, &config)
}

/// Shared middleware stack. A panicking handler is answered with a JSON 500.
fn apply_layers(router: Router, config: &Config) -> Router {
    router
        .layer(DefaultBodyLimit::max(config.upload.max_request_size))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(&config.server.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}
