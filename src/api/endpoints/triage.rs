//! Triage endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, RequestId};
use crate::pipeline::TriageResult;

/// `POST /api/analyze_patient`: intake JSON in, triage result out.
///
/// Only a body that is not JSON at all is rejected. Any JSON value reaches
/// the engine, which answers fail-open.
pub async fn analyze_patient(
    State(ctx): State<ApiContext>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<TriageResult>, ApiError> {
    let intake: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(request_id = %request_id, "Rejected non-JSON triage body: {e}");
        ApiError::BadRequest(format!("Body is not valid JSON: {e}"))
    })?;

    let result = ctx.engine.triage_value(&intake);
    if let Some(error) = &result.error {
        tracing::warn!(
            request_id = %request_id,
            risk_level = ?result.risk_level,
            "Degraded triage result: {error}"
        );
    }
    Ok(Json(result))
}
