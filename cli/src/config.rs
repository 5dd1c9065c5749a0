//! CLI configuration with TOML file support.

use std::path::{Path, PathBuf};
use std::time::Duration;

use facepass_client::DEFAULT_BACKEND_URL;
use facepass_types::{ModelSetSpec, ModelVersion, DEFAULT_MODEL_BASE_URL, DEFAULT_MODEL_VERSION};
use facepass_utils::LogFormat;
use facepass_verification::{
    DetectorOptions, EngineConfig, DEFAULT_MATCH_THRESHOLD, LIVE_INPUT_SIZE,
    LIVE_SCORE_THRESHOLD, REFERENCE_MIN_CONFIDENCE,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings shared by every `facepass` command.
///
/// Loaded from a TOML file via [`FacepassConfig::from_toml_file`]; command
/// line flags and `FACEPASS_*` variables are applied on top by the binary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FacepassConfig {
    /// Backend origin; the REST API lives under `/api`.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Publicly reachable web client URL used in handover links.
    #[serde(default)]
    pub public_url: Option<String>,

    #[serde(default = "default_model_base_url")]
    pub model_base_url: String,

    /// Version every model artifact must carry.
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Distances strictly below this are a match.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    #[serde(default = "default_live_input_size")]
    pub live_input_size: u32,

    #[serde(default = "default_live_score_threshold")]
    pub live_score_threshold: f64,

    #[serde(default = "default_reference_min_confidence")]
    pub reference_min_confidence: f64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Filter directive, e.g. `"info"` or `"debug,facepass_handover=trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_model_base_url() -> String {
    DEFAULT_MODEL_BASE_URL.to_string()
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

fn default_match_threshold() -> f64 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_live_input_size() -> u32 {
    LIVE_INPUT_SIZE
}

fn default_live_score_threshold() -> f64 {
    LIVE_SCORE_THRESHOLD
}

fn default_reference_min_confidence() -> f64 {
    REFERENCE_MIN_CONFIDENCE
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl FacepassConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_url.trim().is_empty() {
            return Err(ConfigError::Invalid("backend_url is empty".into()));
        }
        if !(self.match_threshold.is_finite() && self.match_threshold > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "match_threshold must be positive, got {}",
                self.match_threshold
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be non-zero".into()));
        }
        self.live_detector().validate().map_err(ConfigError::Invalid)?;
        self.reference_detector().validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    pub fn model_spec(&self) -> ModelSetSpec {
        ModelSetSpec::new(
            ModelVersion::new(self.model_version.clone()),
            self.model_base_url.clone(),
        )
    }

    pub fn live_detector(&self) -> DetectorOptions {
        DetectorOptions::TinyFaceDetector {
            input_size: self.live_input_size,
            score_threshold: self.live_score_threshold,
        }
    }

    pub fn reference_detector(&self) -> DetectorOptions {
        DetectorOptions::SsdMobilenetV1 {
            min_confidence: self.reference_min_confidence,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            models: self.model_spec(),
            match_threshold: self.match_threshold,
            live_detector: self.live_detector(),
            reference_detector: self.reference_detector(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for FacepassConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            public_url: None,
            model_base_url: default_model_base_url(),
            model_version: default_model_version(),
            match_threshold: default_match_threshold(),
            live_input_size: default_live_input_size(),
            live_score_threshold: default_live_score_threshold(),
            reference_min_confidence: default_reference_min_confidence(),
            poll_interval_ms: default_poll_interval_ms(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = FacepassConfig::from_toml_str("").unwrap();
        assert_eq!(config, FacepassConfig::default());
        assert_eq!(config.backend_url, "http://localhost:3000");
        assert_eq!(config.match_threshold, 0.6);
        assert_eq!(config.poll_interval(), Duration::from_millis(3000));
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
backend_url = "https://api.example"
public_url = "https://app.example"
match_threshold = 0.5
live_input_size = 416
poll_interval_ms = 1500
log_format = "json"
"#
        )
        .unwrap();

        let config = FacepassConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.backend_url, "https://api.example");
        assert_eq!(config.public_url.as_deref(), Some("https://app.example"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.poll_interval(), Duration::from_millis(1500));

        let engine = config.engine_config();
        assert_eq!(engine.match_threshold, 0.5);
        assert_eq!(
            engine.live_detector,
            DetectorOptions::TinyFaceDetector {
                input_size: 416,
                score_threshold: 0.5
            }
        );
        assert_eq!(engine.models.version.as_str(), DEFAULT_MODEL_VERSION);
    }

    #[test]
    fn serialized_config_reads_back() {
        let config = FacepassConfig {
            public_url: Some("https://app.example".into()),
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(FacepassConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn bad_detector_size_is_rejected() {
        let err = FacepassConfig::from_toml_str("live_input_size = 500").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_log_format_is_parse_error() {
        let err = FacepassConfig::from_toml_str("log_format = \"xml\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = FacepassConfig::from_toml_file(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
