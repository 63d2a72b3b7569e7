//! Triage API router.
//!
//! Returns a composable `Router` with every route under `/api/`.
//! Layers (outermost → innermost): CORS → access log → handler.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

pub fn triage_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(endpoints::health::check))
        .route("/api/analyze_patient", post(endpoints::triage::analyze_patient))
        .route("/api/extract_intake", post(endpoints::intake::extract))
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::access::log_access))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::extraction::{IntakeExtractor, MockLlmClient};
    use crate::pipeline::model::test_support::predicting;
    use crate::pipeline::{ModelHandle, TriageEngine};

    fn ctx(model: ModelHandle) -> ApiContext {
        ApiContext::new(TriageEngine::new(std::sync::Arc::new(model)))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn analyze_patient_returns_triage_result() {
        let app = triage_router(ctx(predicting(0, Some(vec![0.7, 0.2, 0.1]))));
        let (status, json) = send(
            app,
            post_json("/api/analyze_patient", r#"{"age": 30, "symptoms": "sore throat"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["risk_level"], "Low");
        assert_eq!(json["department"], "General Practice");
        assert_eq!(json["priority"], "Normal");
        assert_eq!(json["wait_time"], "45 mins");
        assert!(json["explanations"].as_array().is_some_and(|e| !e.is_empty()));
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn analyze_patient_is_fail_open_without_model() {
        let app = triage_router(ctx(ModelHandle::unavailable("missing")));
        let (status, json) = send(app, post_json("/api/analyze_patient", r#"{"bp": "abc"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["risk_level"], "Medium");
        assert_eq!(json["confidence"], 0.0);
        assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn analyze_patient_non_object_json_is_degraded() {
        let app = triage_router(ctx(predicting(0, None)));
        let (status, json) = send(app, post_json("/api/analyze_patient", "[1, 2, 3]")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["risk_level"], "Medium");
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn analyze_patient_rejects_non_json_body() {
        let app = triage_router(ctx(predicting(0, None)));
        let (status, json) = send(app, post_json("/api/analyze_patient", "age=30")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn health_reports_model_state() {
        let app = triage_router(ctx(predicting(0, None)));
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let (status, json) = send(app, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model"]["available"], true);
        assert_eq!(json["model"]["slot"], "primary");
        assert_eq!(json["model"]["generation"], "reduced_vitals");
        assert_eq!(json["model"]["fingerprint"], "test");
        assert_eq!(json["extraction_enabled"], false);
    }

    #[tokio::test]
    async fn health_reports_degraded_without_model() {
        let app = triage_router(ctx(ModelHandle::unavailable("missing")));
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let (_, json) = send(app, req).await;
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["model"]["available"], false);
        assert!(json["model"]["fingerprint"].is_null());
    }

    #[tokio::test]
    async fn extract_intake_uses_extractor() {
        let reply = json!({ "name": "A. Patient", "age": 64, "symptoms": "chest pain" }).to_string();
        let extractor = IntakeExtractor::new(Box::new(MockLlmClient::new(&reply)), "llama3.1");
        let app = triage_router(ctx(predicting(0, None)).with_extractor(extractor));

        let (status, json) = send(
            app,
            post_json("/api/extract_intake", r#"{"text": "64 y/o with chest pain"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["age"], 64);
        assert_eq!(json["symptoms"], "chest pain");
    }

    #[tokio::test]
    async fn extract_intake_without_extractor_is_503() {
        let app = triage_router(ctx(predicting(0, None)));
        let (status, json) =
            send(app, post_json("/api/extract_intake", r#"{"text": "report"}"#)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "EXTRACTION_UNAVAILABLE");
    }

    #[tokio::test]
    async fn extract_intake_surfaces_upstream_error() {
        let extractor = IntakeExtractor::new(
            Box::new(MockLlmClient::new(r#"{"error": "Empty PDF"}"#)),
            "llama3.1",
        );
        let app = triage_router(ctx(predicting(0, None)).with_extractor(extractor));
        let (status, json) =
            send(app, post_json("/api/extract_intake", r#"{"text": "report"}"#)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json["error"]["message"].as_str().unwrap().contains("Empty PDF"));
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = triage_router(ctx(predicting(0, None)));
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let id = response
            .headers()
            .get(middleware::access::REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = triage_router(ctx(predicting(0, None)));
        let req = Request::builder().uri("/api/patients").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
