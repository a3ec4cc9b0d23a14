use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ProcessingOptions;

/// Application-level constants
pub const APP_NAME: &str = "medbrief";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest input file accepted by `validate_file` and the parser.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Lowercase extensions the pipeline accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "tiff", "txt"];

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "medgemma:4b";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const ENV_OLLAMA_URL: &str = "MEDBRIEF_OLLAMA_URL";
const ENV_MODEL: &str = "MEDBRIEF_MODEL";
const ENV_TIMEOUT_SECS: &str = "MEDBRIEF_TIMEOUT_SECS";
const ENV_SAFETY_RULES: &str = "MEDBRIEF_SAFETY_RULES";
const ENV_CONFIDENCE_THRESHOLD: &str = "MEDBRIEF_CONFIDENCE_THRESHOLD";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "medbrief=debug,warn"
    } else {
        "medbrief=info,warn"
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Confidence threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f32),
}

/// Process-wide settings: where the generation backend lives and the
/// default options applied to every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ollama_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    /// Optional JSON file extending the built-in safety rules.
    pub safety_rules_path: Option<PathBuf>,
    pub options: ProcessingOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            model: DEFAULT_MODEL.into(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            safety_rules_path: None,
            options: ProcessingOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `MEDBRIEF_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_OLLAMA_URL).filter(|v| !v.trim().is_empty()) {
            config.ollama_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout_secs =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
        }
        if let Some(path) = lookup(ENV_SAFETY_RULES).filter(|v| !v.trim().is_empty()) {
            config.safety_rules_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(raw) = lookup(ENV_CONFIDENCE_THRESHOLD) {
            let threshold: f32 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_CONFIDENCE_THRESHOLD,
                value: raw.clone(),
            })?;
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::ThresholdOutOfRange(threshold));
            }
            config.options.confidence_threshold = threshold;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_name_is_medbrief() {
        assert_eq!(APP_NAME, "medbrief");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn max_file_size_is_ten_mib() {
        assert_eq!(MAX_FILE_SIZE, 10_485_760);
    }

    #[test]
    fn log_filter_targets_crate() {
        assert!(default_log_filter().starts_with("medbrief="));
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = PipelineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.ollama_url, DEFAULT_OLLAMA_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert!(config.safety_rules_path.is_none());
        assert_eq!(config.options, ProcessingOptions::default());
    }

    #[test]
    fn environment_overrides_apply() {
        let config = PipelineConfig::from_lookup(lookup_from(&[
            ("MEDBRIEF_OLLAMA_URL", "http://gpu-box:11434/"),
            ("MEDBRIEF_MODEL", "llama3:8b"),
            ("MEDBRIEF_TIMEOUT_SECS", "45"),
            ("MEDBRIEF_SAFETY_RULES", "/etc/medbrief/rules.json"),
            ("MEDBRIEF_CONFIDENCE_THRESHOLD", "0.7"),
        ]))
        .unwrap();
        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.model, "llama3:8b");
        assert_eq!(config.request_timeout_secs, 45);
        assert_eq!(
            config.safety_rules_path,
            Some(PathBuf::from("/etc/medbrief/rules.json"))
        );
        assert_eq!(config.options.confidence_threshold, 0.7);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = PipelineConfig::from_lookup(lookup_from(&[("MEDBRIEF_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "MEDBRIEF_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let err = PipelineConfig::from_lookup(lookup_from(&[(
            "MEDBRIEF_CONFIDENCE_THRESHOLD",
            "1.5",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdOutOfRange(_)));
    }
}
