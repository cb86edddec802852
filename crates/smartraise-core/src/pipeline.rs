//! # Inference Pipeline
//!
//! `predict(features) = model.predict(scaler.transform(features))`.
//!
//! The pipeline is a pure function over immutable artifacts: no interior
//! mutability, no randomness. It is `Send + Sync` and meant to be shared
//! behind an `Arc` by every request handler.

use crate::loader::Artifacts;
use crate::model::Model;
use crate::scaler::Scaler;
use crate::{OutputKind, Prediction, Result, SmartRaiseError};
use serde::{Deserialize, Serialize};

// =============================================================================
// PIPELINE INFO
// =============================================================================

/// Static description of a loaded pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineInfo {
    /// Model family name.
    pub kind: String,
    /// Kind of value every prediction has.
    pub output: OutputKind,
    /// Fitted feature count.
    pub n_features: usize,
    /// Feature names recorded by the scaler, if any.
    pub feature_names: Option<Vec<String>>,
    /// Fingerprint of the model file (empty when built in memory).
    pub model_fingerprint: String,
    /// Fingerprint of the scaler file (empty when built in memory).
    pub scaler_fingerprint: String,
}

// =============================================================================
// INFERENCE PIPELINE
// =============================================================================

/// Standardise, then predict.
pub struct InferencePipeline {
    scaler: Box<dyn Scaler>,
    model: Box<dyn Model>,
    info: PipelineInfo,
}

impl std::fmt::Debug for InferencePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferencePipeline")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl InferencePipeline {
    /// Compose a scaler and a model.
    ///
    /// Returns `ArtifactCorrupt` if they disagree on the feature count.
    pub fn new<S, M>(scaler: S, model: M, kind: impl Into<String>) -> Result<Self>
    where
        S: Scaler + 'static,
        M: Model + 'static,
    {
        if scaler.n_features() != model.n_features() {
            return Err(SmartRaiseError::ArtifactCorrupt(format!(
                "scaler has {} features but model expects {}",
                scaler.n_features(),
                model.n_features()
            )));
        }
        let info = PipelineInfo {
            kind: kind.into(),
            output: model.output_kind(),
            n_features: scaler.n_features(),
            feature_names: scaler.feature_names().map(<[String]>::to_vec),
            model_fingerprint: String::new(),
            scaler_fingerprint: String::new(),
        };
        Ok(Self {
            scaler: Box::new(scaler),
            model: Box::new(model),
            info,
        })
    }

    /// Build from a loaded, already cross-checked artifact pair.
    #[must_use]
    pub fn from_artifacts(artifacts: Artifacts) -> Self {
        let info = PipelineInfo {
            kind: artifacts.model.kind_name().to_string(),
            output: artifacts.model.output_kind(),
            n_features: artifacts.scaler.n_features(),
            feature_names: artifacts.scaler.feature_names.clone(),
            model_fingerprint: artifacts.model_fingerprint,
            scaler_fingerprint: artifacts.scaler_fingerprint,
        };
        Self {
            scaler: Box::new(artifacts.scaler),
            model: Box::new(artifacts.model),
            info,
        }
    }

    /// Description of the loaded artifacts.
    #[must_use]
    pub fn info(&self) -> &PipelineInfo {
        &self.info
    }

    /// Number of features `predict` expects.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.info.n_features
    }

    /// Kind of value `predict` returns.
    #[must_use]
    pub fn output_kind(&self) -> OutputKind {
        self.info.output
    }

    /// Predict from a raw (unscaled) feature vector.
    ///
    /// # Errors
    ///
    /// - `FeatureShapeMismatch` if `features.len() != n_features()`; the model
    ///   is not invoked
    /// - `MalformedRequest` if any feature is NaN or infinite, or if scaling
    ///   or the model turns finite input into a non-finite value
    pub fn predict(&self, features: &[f64]) -> Result<Prediction> {
        if features.len() != self.info.n_features {
            return Err(SmartRaiseError::FeatureShapeMismatch {
                expected: self.info.n_features,
                actual: features.len(),
            });
        }
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(SmartRaiseError::MalformedRequest(format!(
                "feature {} is not a finite number",
                i
            )));
        }

        let scaled = self.scaler.transform(features)?;
        if let Some(i) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(SmartRaiseError::MalformedRequest(format!(
                "feature {} is out of range for the fitted scaler",
                i
            )));
        }
        let prediction = self.model.predict(&scaled)?;
        if !prediction.as_f64().is_finite() {
            return Err(SmartRaiseError::MalformedRequest(
                "prediction is not a finite number".to_string(),
            ));
        }
        Ok(prediction)
    }
}

// =============================================================================
// TESTS
// =============================================================================
