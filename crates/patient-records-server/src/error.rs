//! Mapping of operation errors onto HTTP responses.
//!
//! Every error body is `{"detail": ...}`. Validation failures carry a list of
//! `{"field", "message"}` entries; everything else carries a string.

use std::sync::PoisonError;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use patient_records_core::RecordsError;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned from request handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Records(#[from] RecordsError),

    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("service lock poisoned")]
    LockPoisoned,

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl<T> From<PoisonError<T>> for ApiError {
    fn from(_: PoisonError<T>) -> Self {
        ApiError::LockPoisoned
    }
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, Value) {
        match self {
            ApiError::Records(RecordsError::Validation(errors)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!(errors.errors()))
            }
            ApiError::Records(RecordsError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, json!("Patient not found"))
            }
            ApiError::Records(RecordsError::InvalidArgument(message)) => {
                (StatusCode::BAD_REQUEST, json!(message))
            }
            ApiError::Records(RecordsError::CorruptData(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!("Data file is corrupted"))
            }
            ApiError::Records(RecordsError::Persistence(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!(format!("Failed to save data: {}", e)),
            ),
            ApiError::Body(
                rejection @ (JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_)),
            ) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!([{ "field": "body", "message": rejection.body_text() }]),
            ),
            ApiError::Body(rejection) => (rejection.status(), json!(rejection.body_text())),
            ApiError::LockPoisoned | ApiError::Task(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!("Internal server error"),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();

        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
