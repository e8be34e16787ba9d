use axum::{extract::State, routing::get, Json, Router};

use crate::models::{AppState, LabelsResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/labels", get(list_labels))
        .with_state(state)
}

async fn list_labels(State(state): State<AppState>) -> Json<LabelsResponse> {
    Json(LabelsResponse {
        labels: state.coordinator.labels().as_slice().to_vec(),
    })
}
