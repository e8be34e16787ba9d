use axum::{extract::State, response::Json as ResponseJson, routing::get, Json, Router};

use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> ResponseJson<HealthResponse> {
    let status = if state.coordinator.pool().is_closed() {
        "shutting down"
    } else {
        "ok"
    };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        classifier: state.coordinator.classifier_name().to_string(),
        worker_pool_size: state.coordinator.pool().size(),
    };

    Json(response)
}
