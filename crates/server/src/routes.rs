use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use imagemill_core::{CoreError, OperationsPayload, Processor, VariantRecord};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<Processor>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(process_image))
        .route("/healthz", get(health))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Accept a multipart upload (`source` = image bytes, `operations` = JSON
/// text) and respond with the ordered list of produced variant records.
async fn process_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<Vec<VariantRecord>>> {
    let mut source: Option<Bytes> = None;
    let mut operations: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Invalid multipart data: {}", e)))?
    {
        match field.name() {
            Some("source") => {
                source = Some(field.bytes().await.map_err(|e| {
                    ServerError::BadRequest(format!("Failed to read source image: {}", e))
                })?);
            }
            Some("operations") => {
                operations = Some(field.text().await.map_err(|e| {
                    ServerError::BadRequest(format!("Failed to read operations field: {}", e))
                })?);
            }
            other => {
                debug!(field = ?other, "ignoring unknown multipart field");
            }
        }
    }

    let source = source.ok_or(ServerError::Core(CoreError::MissingSource))?;
    let operations =
        operations.ok_or_else(|| ServerError::BadRequest("No operations list present".to_string()))?;

    let report = state
        .processor
        .process(&source, OperationsPayload::Text(operations))
        .await?;

    if !report.is_success() {
        return Err(ServerError::batch(report));
    }

    Ok(Json(report.records))
}
