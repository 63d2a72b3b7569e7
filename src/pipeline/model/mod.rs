//! Classifier artifacts and the process-lifetime model handle.
//!
//! Two model generations share one call surface. The generation is declared
//! by (or resolved once for) each artifact at load time and selects the
//! feature projection; it is never re-probed per request.
//!
//! Load order: primary ("risk") artifact, then fallback ("health") artifact,
//! then the `Unavailable` sentinel. No other retries.

pub mod hash;
pub mod linear;
#[cfg(feature = "onnx-classifier")]
pub mod onnx;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{FeatureColumn, FeatureVector, FULL_FEATURE_COLUMNS, REDUCED_VITALS_COLUMNS};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported model artifact format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed model artifact: {0}")]
    Malformed(String),

    #[error("Model initialization: {0}")]
    Init(String),

    #[error("Feature schema mismatch: model expects {expected} columns, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Feature schema a classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelGeneration {
    /// Legacy model: every `FeatureVector` column, categoricals encoded.
    FullFeature,
    /// Newer model: age + six vitals.
    ReducedVitals,
}

impl ModelGeneration {
    pub fn columns(&self) -> &'static [FeatureColumn] {
        match self {
            ModelGeneration::FullFeature => &FULL_FEATURE_COLUMNS,
            ModelGeneration::ReducedVitals => &REDUCED_VITALS_COLUMNS,
        }
    }

    pub fn width(&self) -> usize {
        self.columns().len()
    }

    pub fn alternate(&self) -> Self {
        match self {
            ModelGeneration::FullFeature => ModelGeneration::ReducedVitals,
            ModelGeneration::ReducedVitals => ModelGeneration::FullFeature,
        }
    }

    /// Generation whose column count matches `width`, if any.
    pub fn from_width(width: usize) -> Option<Self> {
        [ModelGeneration::ReducedVitals, ModelGeneration::FullFeature]
            .into_iter()
            .find(|g| g.width() == width)
    }
}

/// Which artifact location a model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSlot {
    Primary,
    Fallback,
}

impl ModelSlot {
    /// Generation assumed when an artifact declares none and its shape does
    /// not say either.
    pub fn default_generation(&self) -> ModelGeneration {
        match self {
            ModelSlot::Primary => ModelGeneration::ReducedVitals,
            ModelSlot::Fallback => ModelGeneration::FullFeature,
        }
    }
}

/// Resolve an artifact's generation: declared tag, then input width, then slot.
pub fn resolve_generation(
    declared: Option<ModelGeneration>,
    input_width: Option<usize>,
    slot: ModelSlot,
) -> ModelGeneration {
    declared
        .or_else(|| input_width.and_then(ModelGeneration::from_width))
        .unwrap_or_else(|| slot.default_generation())
}

/// Raw classifier output for a single row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// One predicted class code per model output. The first is risk.
    pub labels: Vec<i64>,
    /// Class distribution of the first output, when the model exposes one.
    pub probabilities: Option<Vec<f32>>,
}

/// Inference backend for one loaded artifact.
pub trait RiskClassifier: Send + Sync {
    /// Number of input columns the artifact accepts, when it declares one.
    fn input_width(&self) -> Option<usize>;

    /// Predict a single already-projected row.
    fn predict_row(&self, row: &[f32]) -> Result<RawPrediction, ModelError>;

    /// Backend name for logs and model descriptions.
    fn backend(&self) -> &'static str;
}

/// A successfully loaded classifier plus its declared schema.
pub struct LoadedModel {
    pub classifier: Box<dyn RiskClassifier>,
    pub generation: ModelGeneration,
    pub slot: ModelSlot,
    pub path: PathBuf,
    /// SHA-256 of the artifact bytes, used as the version identifier.
    pub fingerprint: String,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("backend", &self.classifier.backend())
            .field("generation", &self.generation)
            .field("slot", &self.slot)
            .field("path", &self.path)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

impl LoadedModel {
    /// Project the features for this model's generation and predict.
    ///
    /// On a schema mismatch the alternate projection is tried exactly once.
    pub fn predict(&self, features: &FeatureVector) -> Result<RawPrediction, ModelError> {
        let row = features.project(self.generation.columns());
        match self.classifier.predict_row(&row) {
            Err(ModelError::SchemaMismatch { expected, actual }) => {
                let alternate = self.generation.alternate();
                tracing::warn!(
                    declared = ?self.generation,
                    retry_with = ?alternate,
                    expected,
                    actual,
                    "Classifier rejected feature projection, retrying with alternate subset"
                );
                let row = features.project(alternate.columns());
                self.classifier.predict_row(&row)
            }
            other => other,
        }
    }
}

/// Read-only summary of the active model, for health checks and inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescription {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<ModelSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<ModelGeneration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub feature_columns: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Process-lifetime classifier handle. No mutation API: share it behind
/// `Arc` across concurrent requests.
#[derive(Debug)]
pub enum ModelHandle {
    Loaded(LoadedModel),
    Unavailable { reason: String },
}

impl ModelHandle {
    /// Primary artifact, else fallback artifact, else `Unavailable`.
    pub fn load(primary: &Path, fallback: &Path) -> Self {
        let mut failures = Vec::with_capacity(2);

        for (slot, path) in [(ModelSlot::Primary, primary), (ModelSlot::Fallback, fallback)] {
            tracing::info!(?slot, path = %path.display(), "Loading classifier artifact");
            match load_artifact(path, slot) {
                Ok(model) => {
                    tracing::info!(
                        ?slot,
                        generation = ?model.generation,
                        backend = model.classifier.backend(),
                        fingerprint = %model.fingerprint,
                        "Classifier loaded"
                    );
                    return ModelHandle::Loaded(model);
                }
                Err(e) => {
                    tracing::warn!(?slot, path = %path.display(), "Classifier load failed: {e}");
                    failures.push(format!("{}: {e}", path.display()));
                }
            }
        }

        let reason = failures.join("; ");
        tracing::error!(%reason, "No classifier artifact could be loaded; triage will run degraded");
        ModelHandle::Unavailable { reason }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelHandle::Unavailable { reason: reason.into() }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ModelHandle::Loaded(_))
    }

    pub fn describe(&self) -> ModelDescription {
        match self {
            ModelHandle::Loaded(model) => ModelDescription {
                available: true,
                backend: Some(model.classifier.backend()),
                slot: Some(model.slot),
                generation: Some(model.generation),
                path: Some(model.path.clone()),
                fingerprint: Some(model.fingerprint.clone()),
                feature_columns: model.generation.columns().iter().map(|c| c.name()).collect(),
                reason: None,
            },
            ModelHandle::Unavailable { reason } => ModelDescription {
                available: false,
                backend: None,
                slot: None,
                generation: None,
                path: None,
                fingerprint: None,
                feature_columns: Vec::new(),
                reason: Some(reason.clone()),
            },
        }
    }
}

/// Load one artifact; the backend is chosen by file extension.
pub fn load_artifact(path: &Path, slot: ModelSlot) -> Result<LoadedModel, ModelError> {
    if !path.exists() {
        return Err(ModelError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => {
            let bytes = std::fs::read(path)?;
            let fingerprint = hash::fingerprint(&bytes);
            let (classifier, declared) = linear::LinearClassifier::from_slice(&bytes)?;
            let generation = resolve_generation(declared, classifier.input_width(), slot);
            Ok(LoadedModel {
                classifier: Box::new(classifier),
                generation,
                slot,
                path: path.to_path_buf(),
                fingerprint,
            })
        }
        "onnx" => load_onnx(path, slot),
        other => Err(ModelError::UnsupportedFormat(format!(
            "{} (extension {other:?})",
            path.display()
        ))),
    }
}

#[cfg(feature = "onnx-classifier")]
fn load_onnx(path: &Path, slot: ModelSlot) -> Result<LoadedModel, ModelError> {
    let fingerprint = hash::file_fingerprint(path)?;
    let (classifier, declared) = onnx::OnnxClassifier::load(path)?;
    let generation = resolve_generation(declared, classifier.input_width(), slot);
    Ok(LoadedModel {
        classifier: Box::new(classifier),
        generation,
        slot,
        path: path.to_path_buf(),
        fingerprint,
    })
}

#[cfg(not(feature = "onnx-classifier"))]
fn load_onnx(path: &Path, _slot: ModelSlot) -> Result<LoadedModel, ModelError> {
    Err(ModelError::UnsupportedFormat(format!(
        "{}: ONNX support not compiled in (enable the `onnx-classifier` feature)",
        path.display()
    )))
}
