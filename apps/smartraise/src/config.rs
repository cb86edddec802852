//! # Configuration
//!
//! TOML configuration for the service and the ingestion job.
//!
//! ```toml
//! [artifacts]
//! model = "artifacts/model.srmd"
//! scaler = "artifacts/scaler.srsc"
//! features = ["kpiScore", "attendanceEstimate", "peerReviewScore"]
//!
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//! prediction_shape = "scalar"   # or "list"
//! request_timeout_secs = 10
//! body_limit_bytes = 65536
//!
//! [ingest]
//! database = "smartraise.redb"
//! smoke_test = true
//! ```
//!
//! Every key is optional. A missing file at the default location means
//! defaults; a missing file that was named explicitly is an error.

use serde::{Deserialize, Serialize};
use smartraise_core::primitives::DEFAULT_FEATURES;
use smartraise_core::{Result, SmartRaiseError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "smartraise.toml";

// =============================================================================
// PREDICTION SHAPE
// =============================================================================

/// How `POST /predict` wraps its value. Fixed per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionShape {
    /// `{"prediction": 3}`
    #[default]
    Scalar,
    /// `{"prediction": [3]}`
    List,
}

impl fmt::Display for PredictionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::List => write!(f, "list"),
        }
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactsConfig {
    pub model: Option<PathBuf>,
    pub scaler: Option<PathBuf>,
    /// Feature order the smoke test builds its vector in.
    pub features: Vec<String>,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model: None,
            scaler: None,
            features: DEFAULT_FEATURES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ArtifactsConfig {
    /// Both paths, or a `Config` error naming the missing one.
    pub fn paths(&self) -> Result<(&Path, &Path)> {
        let model = self.model.as_deref().ok_or_else(|| {
            SmartRaiseError::Config("artifacts.model is not set (use --model)".to_string())
        })?;
        let scaler = self.scaler.as_deref().ok_or_else(|| {
            SmartRaiseError::Config("artifacts.scaler is not set (use --scaler)".to_string())
        })?;
        Ok((model, scaler))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub prediction_shape: PredictionShape,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            prediction_shape: PredictionShape::Scalar,
            request_timeout_secs: 10,
            body_limit_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    pub database: PathBuf,
    pub smoke_test: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("smartraise.redb"),
            smoke_test: true,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub artifacts: ArtifactsConfig,
    pub server: ServerConfig,
    pub ingest: IngestConfig,
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Parse and validate TOML text. `source_name` appears in errors.
    pub fn from_toml(content: &str, source_name: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SmartRaiseError::Config(format!("{}: {}", source_name, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| SmartRaiseError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&content, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Reject values no deployment can use.
    pub fn validate(&self) -> Result<()> {
        if self.artifacts.features.is_empty() {
            return Err(SmartRaiseError::Config(
                "artifacts.features must list at least one feature".to_string(),
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(SmartRaiseError::Config(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(SmartRaiseError::Config(
                "server.body_limit_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        let config = Config::from_toml("", "empty").expect("parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.prediction_shape, PredictionShape::Scalar);
        assert_eq!(
            config.artifacts.features,
            vec!["kpiScore", "attendanceEstimate", "peerReviewScore"]
        );
    }

    #[test]
    fn parses_all_sections() {
        let text = r#"
[artifacts]
model = "m.srmd"
scaler = "s.srsc"
features = ["kpiScore", "annualSalary"]

[server]
port = 8080
prediction_shape = "list"

[ingest]
database = "hr.redb"
smoke_test = false
"#;
        let config = Config::from_toml(text, "inline").expect("parse");
        let (model, scaler) = config.artifacts.paths().expect("paths");
        assert_eq!(model, Path::new("m.srmd"));
        assert_eq!(scaler, Path::new("s.srsc"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 10);
        assert_eq!(config.server.prediction_shape, PredictionShape::List);
        assert!(!config.ingest.smoke_test);
    }

    #[test]
    fn unknown_keys_and_shapes_rejected() {
        assert!(Config::from_toml("[server]\nprot = 1\n", "typo").is_err());
        assert!(Config::from_toml("[server]\nprediction_shape = \"matrix\"\n", "x").is_err());
        assert!(Config::from_toml("[artifacts]\nfeatures = []\n", "x").is_err());
    }

    #[test]
    fn missing_artifact_path_named() {
        let err = ArtifactsConfig::default().paths().unwrap_err();
        assert!(err.to_string().contains("artifacts.model"));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(SmartRaiseError::Config(_))));
    }
}
