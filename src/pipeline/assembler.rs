//! Triage engine: runs normalize → classify → override → route → explain and
//! assembles the result behind a fail-open boundary.
//!
//! Nothing escapes `TriageEngine::triage`. An error or panic anywhere in the
//! pipeline produces a degraded result (Medium, last known confidence or 0.0,
//! routing defaults, error populated). An override that already escalated to
//! High is kept.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::classifier::{self, DEGRADED_RISK_LEVEL};
use super::explain::{explain, ROUTINE_EXPLANATION};
use super::model::ModelHandle;
use super::normalize::normalize;
use super::routing;
use super::safety::apply_overrides;
use super::types::{Department, PatientIntake, RiskLevel, TriageResult};

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid intake record: {0}")]
    InvalidIntake(String),

    #[error("Result invariant violated: {0}")]
    InvariantViolated(String),

    #[error("Triage pipeline panicked: {0}")]
    Panicked(String),
}

/// What the pipeline had established before it stopped. Feeds the degraded
/// result on failure.
#[derive(Debug, Default)]
struct PipelineProgress {
    confidence: Option<f64>,
    /// Set once a safety override fired.
    escalated: Option<(RiskLevel, Option<Department>)>,
    explanations: Option<Vec<String>>,
}

/// Stateless triage engine over a shared, read-only model handle.
#[derive(Debug, Clone)]
pub struct TriageEngine {
    model: Arc<ModelHandle>,
}

impl TriageEngine {
    pub fn new(model: Arc<ModelHandle>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Triage one intake record. Always returns a complete result.
    pub fn triage(&self, intake: &PatientIntake) -> TriageResult {
        let mut progress = PipelineProgress::default();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            run_pipeline(&self.model, intake, &mut progress)
        }));

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => fail_open(&progress, e),
            Err(payload) => fail_open(&progress, TriageError::Panicked(panic_message(payload))),
        }
    }

    /// Triage an arbitrary JSON value. Non-object input yields a degraded
    /// result rather than an error.
    pub fn triage_value(&self, value: &Value) -> TriageResult {
        if !value.is_object() {
            return fail_open(
                &PipelineProgress::default(),
                TriageError::InvalidIntake(format!("expected a JSON object, got {}", kind(value))),
            );
        }
        match PatientIntake::deserialize(value) {
            Ok(intake) => self.triage(&intake),
            Err(e) => fail_open(
                &PipelineProgress::default(),
                TriageError::InvalidIntake(e.to_string()),
            ),
        }
    }

    /// Triage raw JSON text (the predict command contract).
    pub fn triage_json_str(&self, input: &str) -> TriageResult {
        match serde_json::from_str::<Value>(input) {
            Ok(value) => self.triage_value(&value),
            Err(e) => fail_open(
                &PipelineProgress::default(),
                TriageError::InvalidIntake(e.to_string()),
            ),
        }
    }
}

fn run_pipeline(
    model: &ModelHandle,
    intake: &PatientIntake,
    progress: &mut PipelineProgress,
) -> Result<TriageResult, TriageError> {
    let features = normalize(intake);
    let symptoms = intake.symptoms_text();

    let classification = classifier::invoke(model, &features);
    progress.confidence = Some(classification.confidence);

    let outcome = apply_overrides(
        classification.risk_level,
        classification.confidence,
        &features,
        symptoms,
    );
    progress.confidence = Some(outcome.confidence);
    if outcome.rule_id.is_some() {
        progress.escalated = Some((outcome.risk_level, outcome.department));
    }

    let route = routing::resolve(outcome.risk_level, outcome.department);

    let explanations = explain(&features, symptoms, features.age);
    progress.explanations = Some(explanations.clone());

    let result = TriageResult {
        risk_level: outcome.risk_level,
        confidence: outcome.confidence,
        department: route.department,
        priority: route.priority,
        wait_time: route.wait_time.to_string(),
        explanations,
        error: classification.error,
    };
    validate(&result)?;

    tracing::debug!(
        risk_level = result.risk_level.as_str(),
        confidence = result.confidence,
        department = result.department.as_str(),
        rule_id = outcome.rule_id,
        "Triage complete"
    );
    Ok(result)
}

fn validate(result: &TriageResult) -> Result<(), TriageError> {
    if !result.confidence.is_finite() || !(0.0..=1.0).contains(&result.confidence) {
        return Err(TriageError::InvariantViolated(format!(
            "confidence {} outside [0, 1]",
            result.confidence
        )));
    }
    if result.explanations.is_empty() {
        return Err(TriageError::InvariantViolated("no explanations".into()));
    }
    Ok(())
}

/// Degraded result from whatever the pipeline had established.
fn fail_open(progress: &PipelineProgress, error: TriageError) -> TriageResult {
    tracing::error!("Triage failed open: {error}");

    let (risk_level, department) = progress
        .escalated
        .unwrap_or((DEGRADED_RISK_LEVEL, None));
    let route = routing::resolve(risk_level, department);
    let confidence = progress
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let explanations = progress
        .explanations
        .clone()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| vec![ROUTINE_EXPLANATION.to_string()]);

    TriageResult {
        risk_level,
        confidence,
        department: route.department,
        priority: route.priority,
        wait_time: route.wait_time.to_string(),
        explanations,
        error: Some(error.to_string()),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
