//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::extraction::ExtractionError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
///
/// The triage endpoint only ever produces `BadRequest` (body is not JSON);
/// everything past parsing is handled fail-open by the engine.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Intake extraction is not configured")]
    ExtractionUnavailable,
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::ExtractionUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "EXTRACTION_UNAVAILABLE",
                self.to_string(),
            ),
            ApiError::Extraction(err) => extraction_status(err),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

fn extraction_status(err: &ExtractionError) -> (StatusCode, &'static str, String) {
    match err {
        ExtractionError::EmptyDocument => {
            (StatusCode::BAD_REQUEST, "EMPTY_DOCUMENT", err.to_string())
        }
        ExtractionError::LlmConnection(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "LLM_UNAVAILABLE",
            err.to_string(),
        ),
        ExtractionError::Io(e) => {
            tracing::error!(error = %e, "Extraction I/O error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "An internal error occurred".to_string(),
            )
        }
        ExtractionError::LlmError { .. }
        | ExtractionError::HttpClient(_)
        | ExtractionError::ResponseParsing(_)
        | ExtractionError::MalformedResponse(_)
        | ExtractionError::Upstream(_) => {
            tracing::warn!(error = %err, "Intake extraction failed");
            (StatusCode::BAD_GATEWAY, "EXTRACTION_FAILED", err.to_string())
        }
    }
}
