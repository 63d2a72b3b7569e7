use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Hybrid Triage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Primary ("risk") classifier artifact, reduced vitals-only feature set.
/// The default extension follows the compiled backend.
#[cfg(feature = "onnx-classifier")]
pub const PRIMARY_MODEL_FILE: &str = "risk_model.onnx";
#[cfg(not(feature = "onnx-classifier"))]
pub const PRIMARY_MODEL_FILE: &str = "risk_model.json";

/// Fallback ("health") classifier artifact, full legacy feature set.
#[cfg(feature = "onnx-classifier")]
pub const FALLBACK_MODEL_FILE: &str = "health_model.onnx";
#[cfg(not(feature = "onnx-classifier"))]
pub const FALLBACK_MODEL_FILE: &str = "health_model.json";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_LLM_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3.1";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,hybrid_triage_lib=debug"
}

/// Get the application data directory
/// (platform local data dir, falling back to the working directory).
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hybrid-triage")
}

/// Get the models directory (classifier artifacts)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration, resolved from `TRIAGE_*` environment variables.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TriageConfig {
    pub model_dir: PathBuf,
    pub primary_model: PathBuf,
    pub fallback_model: PathBuf,
    pub bind_addr: SocketAddr,
    pub llm_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
}

impl TriageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let model_dir = get("TRIAGE_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(models_dir);
        let primary_model = get("TRIAGE_PRIMARY_MODEL")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(PRIMARY_MODEL_FILE));
        let fallback_model = get("TRIAGE_FALLBACK_MODEL")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_MODEL_FILE));

        let bind_raw = get("TRIAGE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "TRIAGE_BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let llm_url = get("TRIAGE_LLM_URL").unwrap_or_else(|| DEFAULT_LLM_URL.to_string());
        if !(llm_url.starts_with("http://") || llm_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "TRIAGE_LLM_URL",
                value: llm_url,
            });
        }
        let llm_model = get("TRIAGE_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());

        let llm_timeout_secs = match get("TRIAGE_LLM_TIMEOUT_SECS") {
            None => DEFAULT_LLM_TIMEOUT_SECS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "TRIAGE_LLM_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            model_dir,
            primary_model,
            fallback_model,
            bind_addr,
            llm_url,
            llm_model,
            llm_timeout_secs,
        })
    }

    /// Primary artifact path. Absolute overrides ignore `model_dir`.
    pub fn primary_model_path(&self) -> PathBuf {
        self.model_dir.join(&self.primary_model)
    }

    pub fn fallback_model_path(&self) -> PathBuf {
        self.model_dir.join(&self.fallback_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn models_dir_under_app_data() {
        let models = models_dir();
        assert!(models.starts_with(app_data_dir()));
        assert!(models.ends_with("models"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_when_env_empty() {
        let config = TriageConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.llm_url, DEFAULT_LLM_URL);
        assert_eq!(config.llm_timeout_secs, DEFAULT_LLM_TIMEOUT_SECS);
        assert!(config.primary_model_path().ends_with(PRIMARY_MODEL_FILE));
        assert!(config.fallback_model_path().ends_with(FALLBACK_MODEL_FILE));
    }

    #[test]
    fn model_paths_join_model_dir() {
        let config = TriageConfig::from_lookup(lookup(&[
            ("TRIAGE_MODEL_DIR", "/srv/triage"),
            ("TRIAGE_PRIMARY_MODEL", "risk_model.json"),
        ]))
        .unwrap();
        assert_eq!(
            config.primary_model_path(),
            PathBuf::from("/srv/triage/risk_model.json")
        );
    }

    #[test]
    fn absolute_model_override_ignores_dir() {
        let config = TriageConfig::from_lookup(lookup(&[
            ("TRIAGE_MODEL_DIR", "/srv/triage"),
            ("TRIAGE_FALLBACK_MODEL", "/opt/legacy/health.json"),
        ]))
        .unwrap();
        assert_eq!(
            config.fallback_model_path(),
            PathBuf::from("/opt/legacy/health.json")
        );
    }

    #[test]
    fn blank_values_take_defaults() {
        let config =
            TriageConfig::from_lookup(lookup(&[("TRIAGE_BIND_ADDR", "   ")])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
    }

    #[test]
    fn invalid_bind_addr_rejected() {
        let err = TriageConfig::from_lookup(lookup(&[("TRIAGE_BIND_ADDR", "localhost")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "TRIAGE_BIND_ADDR", .. }));
    }

    #[test]
    fn non_http_llm_url_rejected() {
        let err = TriageConfig::from_lookup(lookup(&[("TRIAGE_LLM_URL", "ftp://x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "TRIAGE_LLM_URL", .. }));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = TriageConfig::from_lookup(lookup(&[("TRIAGE_LLM_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "TRIAGE_LLM_TIMEOUT_SECS",
                value: "0".into()
            }
        );
        assert_eq!(err.to_string(), "Invalid value for TRIAGE_LLM_TIMEOUT_SECS: 0");
    }

    #[cfg(not(feature = "onnx-classifier"))]
    #[test]
    fn default_artifact_names_load_with_linear_backend() {
        use crate::pipeline::{ModelHandle, ModelSlot};

        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_string_lossy().into_owned();
        let config = TriageConfig::from_lookup(lookup(&[("TRIAGE_MODEL_DIR", dir_str.as_str())]))
            .unwrap();

        let artifact = serde_json::json!({
            "classes": [0, 1, 2],
            "weights": [vec![0.0; 7], vec![0.0; 7], vec![0.0; 7]],
            "bias": [0.0, 1.0, 0.0],
        });
        std::fs::write(config.primary_model_path(), artifact.to_string()).unwrap();

        let model = ModelHandle::load(&config.primary_model_path(), &config.fallback_model_path());
        assert!(model.is_available());
        assert_eq!(model.describe().slot, Some(ModelSlot::Primary));
    }
}
