//! Portable linear classifier artifact (multinomial logistic regression).
//!
//! JSON layout:
//! ```json
//! {
//!   "generation": "reduced_vitals",
//!   "classes": [0, 1, 2],
//!   "weights": [[...], [...], [...]],
//!   "bias": [0.0, 0.0, 0.0],
//!   "probabilities": true,
//!   "secondary_outputs": [{ "classes": [...], "weights": [...], "bias": [...] }]
//! }
//! ```
//! `generation` is optional. `secondary_outputs` models multi-output
//! artifacts (e.g. a department head); only their labels are reported.

use serde::Deserialize;

use super::{ModelError, ModelGeneration, RawPrediction, RiskClassifier};

#[derive(Debug, Clone, Deserialize)]
struct LinearHead {
    classes: Vec<i64>,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct LinearArtifact {
    #[serde(default)]
    generation: Option<ModelGeneration>,
    #[serde(flatten)]
    head: LinearHead,
    #[serde(default = "default_true")]
    probabilities: bool,
    #[serde(default)]
    secondary_outputs: Vec<LinearHead>,
}

fn default_true() -> bool {
    true
}

impl LinearHead {
    fn validate(&self, label: &str) -> Result<usize, ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::Malformed(format!("{label}: no classes")));
        }
        if self.weights.len() != self.classes.len() || self.bias.len() != self.classes.len() {
            return Err(ModelError::Malformed(format!(
                "{label}: {} classes but {} weight rows and {} biases",
                self.classes.len(),
                self.weights.len(),
                self.bias.len()
            )));
        }
        let width = self.weights[0].len();
        if width == 0 || self.weights.iter().any(|row| row.len() != width) {
            return Err(ModelError::Malformed(format!("{label}: ragged or empty weight rows")));
        }
        let finite = self
            .weights
            .iter()
            .flatten()
            .chain(self.bias.iter())
            .all(|w| w.is_finite());
        if !finite {
            return Err(ModelError::Malformed(format!("{label}: non-finite coefficients")));
        }
        Ok(width)
    }

    /// Softmax class distribution for one row. Scores that overflow `f32`
    /// are an inference error, not a prediction.
    fn distribution(&self, row: &[f32]) -> Result<Vec<f32>, ModelError> {
        let scores: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(w, b)| w.iter().zip(row).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ModelError::Inference("class score overflowed".into()));
        }

        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        let distribution: Vec<f32> = exps.into_iter().map(|e| e / total).collect();
        if distribution.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::Inference("non-finite class probability".into()));
        }
        Ok(distribution)
    }

    /// Predicted class and its distribution. Ties resolve to the first class.
    fn predict(&self, row: &[f32]) -> Result<(i64, Vec<f32>), ModelError> {
        let distribution = self.distribution(row)?;
        let mut best = 0;
        for (idx, p) in distribution.iter().enumerate() {
            if *p > distribution[best] {
                best = idx;
            }
        }
        Ok((self.classes[best], distribution))
    }
}

pub struct LinearClassifier {
    head: LinearHead,
    secondary: Vec<LinearHead>,
    emit_probabilities: bool,
    width: usize,
}

impl LinearClassifier {
    /// Parse and validate an artifact. Returns the classifier and its
    /// declared generation, if any.
    pub fn from_slice(bytes: &[u8]) -> Result<(Self, Option<ModelGeneration>), ModelError> {
        let artifact: LinearArtifact = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::Malformed(format!("linear artifact: {e}")))?;

        let width = artifact.head.validate("risk output")?;
        for (idx, head) in artifact.secondary_outputs.iter().enumerate() {
            let secondary_width = head.validate(&format!("secondary output {idx}"))?;
            if secondary_width != width {
                return Err(ModelError::Malformed(format!(
                    "secondary output {idx} expects {secondary_width} columns, risk output {width}"
                )));
            }
        }

        if let Some(generation) = artifact.generation {
            if generation.width() != width {
                return Err(ModelError::Malformed(format!(
                    "declared {generation:?} ({} columns) but weights have {width}",
                    generation.width()
                )));
            }
        }

        Ok((
            Self {
                head: artifact.head,
                secondary: artifact.secondary_outputs,
                emit_probabilities: artifact.probabilities,
                width,
            },
            artifact.generation,
        ))
    }
}

impl RiskClassifier for LinearClassifier {
    fn input_width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn predict_row(&self, row: &[f32]) -> Result<RawPrediction, ModelError> {
        if row.len() != self.width {
            return Err(ModelError::SchemaMismatch {
                expected: self.width,
                actual: row.len(),
            });
        }
        if row.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::Inference("non-finite feature value".into()));
        }

        let (label, distribution) = self.head.predict(row)?;
        let mut labels = vec![label];
        for head in &self.secondary {
            labels.push(head.predict(row)?.0);
        }

        Ok(RawPrediction {
            labels,
            probabilities: self.emit_probabilities.then_some(distribution),
        })
    }

    fn backend(&self) -> &'static str {
        "linear"
    }
}
