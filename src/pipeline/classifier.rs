//! Classifier invocation: model output → (risk level, confidence).

use super::model::{ModelHandle, RawPrediction};
use super::types::{FeatureVector, RiskLevel};

/// Confidence reported when the model exposes no class distribution.
pub const FALLBACK_CONFIDENCE: f64 = 0.85;

/// Risk level used whenever the model cannot answer.
pub const DEGRADED_RISK_LEVEL: RiskLevel = RiskLevel::Medium;

pub const MODEL_UNAVAILABLE_MESSAGE: &str = "Model file not found or failed to load";

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub risk_level: RiskLevel,
    pub confidence: f64,
    /// Set when the model was unavailable or inference failed.
    pub error: Option<String>,
    /// Labels of any additional model outputs. Not used for routing.
    pub discarded_outputs: Vec<i64>,
}

impl Classification {
    fn degraded(error: String) -> Self {
        Self {
            risk_level: DEGRADED_RISK_LEVEL,
            confidence: 0.0,
            error: Some(error),
            discarded_outputs: Vec::new(),
        }
    }
}

/// Run the loaded classifier on one feature vector. Never fails: an
/// unavailable model or an inference error yields (Medium, 0.0) with an
/// error annotation.
pub fn invoke(model: &ModelHandle, features: &FeatureVector) -> Classification {
    let loaded = match model {
        ModelHandle::Loaded(loaded) => loaded,
        ModelHandle::Unavailable { reason } => {
            return Classification::degraded(format!("{MODEL_UNAVAILABLE_MESSAGE}: {reason}"));
        }
    };

    match loaded.predict(features) {
        Ok(prediction) => interpret(prediction),
        Err(e) => {
            tracing::error!(
                slot = ?loaded.slot,
                generation = ?loaded.generation,
                "Classifier inference failed, treating model as unavailable: {e}"
            );
            Classification::degraded(format!("{MODEL_UNAVAILABLE_MESSAGE}: {e}"))
        }
    }
}

/// First output is the risk class; later outputs are discarded.
fn interpret(prediction: RawPrediction) -> Classification {
    let mut labels = prediction.labels.into_iter();
    let risk_level = match labels.next() {
        Some(code) => RiskLevel::from_class_code(code).unwrap_or_else(|| {
            tracing::warn!(code, "Unknown risk class code, using Medium");
            RiskLevel::Medium
        }),
        None => {
            tracing::warn!("Classifier returned no labels, using Medium");
            RiskLevel::Medium
        }
    };
    let discarded_outputs: Vec<i64> = labels.collect();
    if !discarded_outputs.is_empty() {
        tracing::debug!(?discarded_outputs, "Secondary model outputs discarded");
    }

    Classification {
        risk_level,
        confidence: confidence_from(prediction.probabilities.as_deref()),
        error: None,
        discarded_outputs,
    }
}

/// Maximum class probability clamped to [0, 1], or the fixed fallback when
/// no usable distribution exists.
pub fn confidence_from(probabilities: Option<&[f32]>) -> f64 {
    probabilities
        .and_then(|probs| {
            probs
                .iter()
                .copied()
                .filter(|p| p.is_finite())
                .fold(None, |best: Option<f32>, p| Some(best.map_or(p, |b| b.max(p))))
        })
        .map(|p| f64::from(p).clamp(0.0, 1.0))
        .unwrap_or(FALLBACK_CONFIDENCE)
}
