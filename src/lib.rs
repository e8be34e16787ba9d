// Docsort - batch document text extraction and classification service

pub mod classifier;
pub mod config;
pub mod extraction;
pub mod formats;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
