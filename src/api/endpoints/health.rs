//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::pipeline::model::{ModelGeneration, ModelSlot};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" with a loaded model, "degraded" when triage runs without one.
    pub status: &'static str,
    pub version: &'static str,
    pub started_at: String,
    pub model: ModelHealth,
    pub extraction_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelHealth {
    pub available: bool,
    pub slot: Option<ModelSlot>,
    pub generation: Option<ModelGeneration>,
    pub fingerprint: Option<String>,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let description = ctx.engine.model().describe();

    Json(HealthResponse {
        status: if description.available { "ok" } else { "degraded" },
        version: crate::config::APP_VERSION,
        started_at: ctx.started_at.to_rfc3339(),
        model: ModelHealth {
            available: description.available,
            slot: description.slot,
            generation: description.generation,
            fingerprint: description.fingerprint,
        },
        extraction_enabled: ctx.extractor.is_some(),
    })
}
