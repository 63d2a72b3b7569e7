//! ONNX Runtime classifier backend (behind the `onnx-classifier` feature).
//!
//! Expects a converted tree/linear classifier with one float input of shape
//! `[1, width]`, an int64 label output first and, optionally, a float
//! probability output. An optional sidecar `<artifact>.schema.json` declares
//! the generation and output names:
//!
//! ```json
//! { "generation": "reduced_vitals", "probability_output": "probabilities" }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ort::session::Session;
use serde::Deserialize;

use super::{ModelError, ModelGeneration, RawPrediction, RiskClassifier};

const DEFAULT_PROBABILITY_OUTPUT: &str = "probabilities";

#[derive(Debug, Default, Deserialize)]
struct SchemaSidecar {
    #[serde(default)]
    generation: Option<ModelGeneration>,
    #[serde(default)]
    probability_output: Option<String>,
}

/// Sidecar path for an artifact: `risk_model.onnx` → `risk_model.onnx.schema.json`.
pub fn sidecar_path(model_path: &Path) -> PathBuf {
    let mut name = model_path.as_os_str().to_owned();
    name.push(".schema.json");
    PathBuf::from(name)
}

fn read_sidecar(model_path: &Path) -> Result<SchemaSidecar, ModelError> {
    let path = sidecar_path(model_path);
    if !path.exists() {
        return Ok(SchemaSidecar::default());
    }
    let bytes = std::fs::read(&path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ModelError::Malformed(format!("{}: {e}", path.display())))
}

/// A lock poisoned by an earlier panic is taken over, not reported.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn require_label_output(output_count: usize) -> Result<(), ModelError> {
    if output_count == 0 {
        return Err(ModelError::Inference("ONNX graph produced no outputs".into()));
    }
    Ok(())
}

/// Uses interior mutability (Mutex) because `Session::run` requires `&mut self`
/// but `RiskClassifier` exposes `&self` for shared usage.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    width: Option<usize>,
    probability_output: String,
}

impl OnnxClassifier {
    /// Load the ONNX artifact and its optional schema sidecar.
    pub fn load(model_path: &Path) -> Result<(Self, Option<ModelGeneration>), ModelError> {
        if !model_path.exists() {
            return Err(ModelError::NotFound(model_path.to_path_buf()));
        }

        let sidecar = read_sidecar(model_path)?;

        let session = Session::builder()
            .map_err(|e: ort::Error| ModelError::Init(e.to_string()))?
            .with_intra_threads(1)
            .map_err(|e: ort::Error| ModelError::Init(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e: ort::Error| ModelError::Init(format!("ONNX load failed: {e}")))?;

        tracing::info!(
            path = %model_path.display(),
            declared = ?sidecar.generation,
            "ONNX classifier loaded"
        );

        Ok((
            Self {
                session: Mutex::new(session),
                width: sidecar.generation.map(|g| g.width()),
                probability_output: sidecar
                    .probability_output
                    .unwrap_or_else(|| DEFAULT_PROBABILITY_OUTPUT.to_string()),
            },
            sidecar.generation,
        ))
    }
}

impl RiskClassifier for OnnxClassifier {
    fn input_width(&self) -> Option<usize> {
        self.width
    }

    fn predict_row(&self, row: &[f32]) -> Result<RawPrediction, ModelError> {
        use ort::value::TensorRef;

        if let Some(width) = self.width {
            if row.len() != width {
                return Err(ModelError::SchemaMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
        }

        let input = ndarray::Array2::from_shape_vec((1, row.len()), row.to_vec())
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        let input_tensor = TensorRef::from_array_view(&input)
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let mut session = lock_session(&self.session);

        let outputs = session.run(ort::inputs![input_tensor]).map_err(|e| {
            let message = e.to_string();
            // ORT reports wrong input widths as invalid-argument shape errors.
            if message.contains("dimension") || message.contains("shape") {
                ModelError::SchemaMismatch {
                    expected: self.width.unwrap_or(0),
                    actual: row.len(),
                }
            } else {
                ModelError::Inference(format!("ONNX inference failed: {message}"))
            }
        })?;

        require_label_output(outputs.len())?;
        let (_, labels) = outputs[0]
            .try_extract_tensor::<i64>()
            .map_err(|e| ModelError::Inference(format!("Label extraction: {e}")))?;
        if labels.is_empty() {
            return Err(ModelError::Inference("Empty label output".into()));
        }

        let probabilities = match outputs.get(self.probability_output.as_str()) {
            Some(value) => {
                let (_, data) = value
                    .try_extract_tensor::<f32>()
                    .map_err(|e| ModelError::Inference(format!("Probability extraction: {e}")))?;
                Some(data.to_vec())
            }
            None => None,
        };

        Ok(RawPrediction {
            labels: labels.to_vec(),
            probabilities,
        })
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }
}
