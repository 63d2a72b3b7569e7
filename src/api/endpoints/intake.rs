//! Document → intake extraction endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, RequestId};
use crate::pipeline::PatientIntake;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

/// `POST /api/extract_intake`: `{"text": "..."}` in, intake record out.
///
/// The LLM call is blocking and runs on the blocking pool.
pub async fn extract(
    State(ctx): State<ApiContext>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<PatientIntake>, ApiError> {
    let request: ExtractRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Expected {{\"text\": ...}}: {e}")))?;

    let extractor = ctx.extractor.clone().ok_or(ApiError::ExtractionUnavailable)?;

    let outcome = tokio::task::spawn_blocking(move || extractor.extract(&request.text))
        .await
        .map_err(|e| ApiError::Internal(format!("Extraction task failed: {e}")))?;

    match outcome {
        Ok(intake) => Ok(Json(intake)),
        Err(e) => {
            tracing::warn!(request_id = %request_id, "Intake extraction failed: {e}");
            Err(e.into())
        }
    }
}
