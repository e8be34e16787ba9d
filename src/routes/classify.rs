use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{debug, info};

use crate::models::{AppState, BatchResults, RawUpload};
use crate::pipeline::BatchRejection;
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/classify_file", post(classify_files))
        .with_state(state)
}

async fn classify_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<BatchResults>> {
    let mut multipart = multipart.map_err(|e| BatchRejection::Malformed(e.body_text()))?;

    let uploads = collect_uploads(&mut multipart, &state.config.upload.field_name).await?;
    info!(parts = uploads.len(), "Classification request received");

    let files = state.validator.validate(uploads)?;
    let results = state.coordinator.process(files).await;

    Ok(Json(results))
}

/// Read every part named `field_name` into memory, in request order.
async fn collect_uploads(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Vec<RawUpload>, BatchRejection> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_rejection)? {
        if field.name() != Some(field_name) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await.map_err(multipart_rejection)?;
        uploads.push(RawUpload::new(filename, content));
    }

    Ok(uploads)
}

fn multipart_rejection(err: MultipartError) -> BatchRejection {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        BatchRejection::BodyTooLarge(err.body_text())
    } else {
        BatchRejection::Malformed(err.body_text())
    }
}
