//! # Artifact Loader
//!
//! Reads the fitted scaler and model from local storage and hands them over
//! as one validated unit.
//!
//! Loading is all-or-nothing: either both artifacts decode, validate and
//! agree on the feature count, or the caller gets an error. There is no
//! scaler-only or model-only state.

use crate::formats::{fingerprint, model_from_bytes, scaler_from_bytes};
use crate::model::{Model, ModelSpec};
use crate::pipeline::InferencePipeline;
use crate::primitives::MAX_ARTIFACT_SIZE;
use crate::scaler::{Scaler, StandardScaler};
use crate::{Result, SmartRaiseError};
use std::path::{Path, PathBuf};

// =============================================================================
// LOADED ARTIFACTS
// =============================================================================

/// A validated scaler/model pair plus the fingerprints of their files.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub scaler: StandardScaler,
    pub model: ModelSpec,
    pub scaler_fingerprint: String,
    pub model_fingerprint: String,
}

impl Artifacts {
    /// Pair already-decoded artifacts, checking they agree.
    pub fn new(scaler: StandardScaler, model: ModelSpec) -> Result<Self> {
        check_compatible(&scaler, &model)?;
        Ok(Self {
            scaler,
            model,
            scaler_fingerprint: String::new(),
            model_fingerprint: String::new(),
        })
    }

    /// Check the artifacts against an externally supplied feature order.
    ///
    /// The order is only comparable when the scaler recorded feature names;
    /// otherwise only the count is checked.
    pub fn check_feature_order(&self, expected: &[String]) -> Result<()> {
        if expected.len() != self.scaler.n_features() {
            return Err(SmartRaiseError::Config(format!(
                "configured feature order lists {} features, artifacts expect {}",
                expected.len(),
                self.scaler.n_features()
            )));
        }
        if let Some(names) = self.scaler.feature_names()
            && names != expected
        {
            return Err(SmartRaiseError::Config(format!(
                "configured feature order {:?} differs from artifact order {:?}",
                expected, names
            )));
        }
        Ok(())
    }

    /// Build the inference pipeline, consuming the artifacts.
    #[must_use]
    pub fn into_pipeline(self) -> InferencePipeline {
        InferencePipeline::from_artifacts(self)
    }
}

fn check_compatible(scaler: &StandardScaler, model: &ModelSpec) -> Result<()> {
    if scaler.n_features() != model.n_features() {
        return Err(SmartRaiseError::ArtifactCorrupt(format!(
            "scaler has {} features but model expects {}",
            scaler.n_features(),
            model.n_features()
        )));
    }
    Ok(())
}

// =============================================================================
// FILE ACCESS
// =============================================================================

/// Resolve and read an artifact file, enforcing the size cap.
fn read_artifact(path: &Path, what: &str) -> Result<(PathBuf, Vec<u8>)> {
    let canonical = path.canonicalize().map_err(|e| {
        SmartRaiseError::ArtifactNotFound(format!("{} '{}': {}", what, path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(SmartRaiseError::ArtifactNotFound(format!(
            "{} '{}' is not a regular file",
            what,
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical).map_err(|e| {
        SmartRaiseError::ArtifactNotFound(format!("{} '{}': {}", what, path.display(), e))
    })?;
    if metadata.len() > MAX_ARTIFACT_SIZE {
        return Err(SmartRaiseError::ArtifactCorrupt(format!(
            "{} '{}' is {} bytes, maximum is {}",
            what,
            path.display(),
            metadata.len(),
            MAX_ARTIFACT_SIZE
        )));
    }

    let bytes = std::fs::read(&canonical)
        .map_err(|e| SmartRaiseError::IoError(format!("read {}: {}", what, e)))?;
    Ok((canonical, bytes))
}

/// Load and validate a scaler artifact. Returns the scaler and its fingerprint.
pub fn load_scaler(path: &Path) -> Result<(StandardScaler, String)> {
    let (canonical, bytes) = read_artifact(path, "scaler")?;
    let scaler = scaler_from_bytes(&bytes).map_err(|e| with_path(e, &canonical))?;
    Ok((scaler, fingerprint(&bytes)))
}

/// Load and validate a model artifact. Returns the model and its fingerprint.
pub fn load_model(path: &Path) -> Result<(ModelSpec, String)> {
    let (canonical, bytes) = read_artifact(path, "model")?;
    let model = model_from_bytes(&bytes).map_err(|e| with_path(e, &canonical))?;
    Ok((model, fingerprint(&bytes)))
}

fn with_path(err: SmartRaiseError, path: &Path) -> SmartRaiseError {
    match err {
        SmartRaiseError::ArtifactCorrupt(msg) => {
            SmartRaiseError::ArtifactCorrupt(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}

/// Load both artifacts.
///
/// # Errors
///
/// - `ArtifactNotFound` if either path does not resolve to a file
/// - `ArtifactCorrupt` if either file fails to decode or validate, or the
///   two disagree on the feature count
pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Artifacts> {
    let (model, model_fingerprint) = load_model(model_path)?;
    let (scaler, scaler_fingerprint) = load_scaler(scaler_path)?;
    check_compatible(&scaler, &model)?;

    tracing::info!(
        model = %model_path.display(),
        scaler = %scaler_path.display(),
        kind = model.kind_name(),
        n_features = scaler.n_features(),
        model_fingerprint = %model_fingerprint,
        scaler_fingerprint = %scaler_fingerprint,
        "Artifacts loaded"
    );

    Ok(Artifacts {
        scaler,
        model,
        scaler_fingerprint,
        model_fingerprint,
    })
}

// =============================================================================
// TESTS
// =============================================================================
