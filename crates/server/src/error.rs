use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imagemill_core::{BatchReport, CoreError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Batch processing failed: {} task(s) failed", .failures.len())]
    Batch {
        failures: Vec<FailedTask>,
        stored: Vec<String>,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// One failed task in a batch error body.
#[derive(Debug, Serialize)]
pub struct FailedTask {
    pub filename: String,
    pub error: String,
}

impl ServerError {
    /// A batch where some tasks failed: the response names the failures
    /// and the sibling writes that are already durable (storage has no
    /// rollback).
    pub fn batch(report: BatchReport) -> Self {
        Self::Batch {
            stored: report.records.iter().map(|r| r.url.clone()).collect(),
            failures: report
                .failures
                .into_iter()
                .map(|f| FailedTask {
                    filename: f.filename,
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Core(core_err) => {
                let status = if core_err.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                error_body(status, core_err.to_string()).into_response()
            }
            ServerError::BadRequest(msg) => {
                error_body(StatusCode::BAD_REQUEST, msg).into_response()
            }
            ServerError::Batch { failures, stored } => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = Json(json!({
                    "error": format!("{} task(s) failed", failures.len()),
                    "status": status.as_u16(),
                    "failures": failures,
                    "stored": stored,
                }));
                (status, body).into_response()
            }
            ServerError::Internal(msg) => {
                error_body(StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
            }
        }
    }
}

fn error_body(status: StatusCode, message: String) -> (StatusCode, Json<serde_json::Value>) {
    let body = Json(json!({
        "error": message,
        "status": status.as_u16()
    }));
    (status, body)
}
