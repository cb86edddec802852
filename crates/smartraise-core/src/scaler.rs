//! # Feature Scaler
//!
//! The first stage of the inference pipeline: a fitted per-feature affine
//! normalisation `x' = (x - mean_i) / scale_i`.
//!
//! Features are identified by position only. The optional `feature_names`
//! are carried for operators and for checking the configured feature order;
//! they are never used to reorder input.

use crate::primitives::MAX_FEATURES;
use crate::{Result, SmartRaiseError};
use serde::{Deserialize, Serialize};

// =============================================================================
// SCALER TRAIT
// =============================================================================

/// A fitted feature transform.
///
/// Implementations are immutable after construction and shared read-only
/// across request handlers.
pub trait Scaler: Send + Sync {
    /// Number of features the scaler was fitted with.
    fn n_features(&self) -> usize;

    /// Standardise a feature vector.
    ///
    /// Returns `FeatureShapeMismatch` if `x.len() != n_features()`.
    fn transform(&self, x: &[f64]) -> Result<Vec<f64>>;

    /// Map a standardised vector back to the original feature space.
    fn inverse_transform(&self, x: &[f64]) -> Result<Vec<f64>>;

    /// Feature names recorded at fitting time, if any.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }
}

// =============================================================================
// STANDARD SCALER
// =============================================================================

/// Mean/scale standardisation, parameter-compatible with a fitted
/// `StandardScaler` (`mean_`, `scale_`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-feature mean subtracted before scaling.
    pub mean: Vec<f64>,
    /// Per-feature divisor. Never zero.
    pub scale: Vec<f64>,
    /// Optional feature names, in positional order.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    /// Create a validated scaler.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self {
            mean,
            scale,
            feature_names: None,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Attach feature names. The count must match the fitted feature count.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        self.feature_names = Some(names);
        self.validate()?;
        Ok(self)
    }

    /// Check the parameters form a usable transform.
    ///
    /// Rejects empty or mismatched vectors, non-finite values and zero scale.
    pub fn validate(&self) -> Result<()> {
        if self.mean.is_empty() {
            return Err(corrupt("scaler has no features"));
        }
        if self.mean.len() > MAX_FEATURES {
            return Err(corrupt(format!(
                "scaler declares {} features, maximum is {}",
                self.mean.len(),
                MAX_FEATURES
            )));
        }
        if self.mean.len() != self.scale.len() {
            return Err(corrupt(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(corrupt(format!("mean[{}] is not finite", i)));
        }
        if let Some(i) = self
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(corrupt(format!(
                "scale[{}] must be finite and non-zero",
                i
            )));
        }
        if let Some(names) = &self.feature_names
            && names.len() != self.mean.len()
        {
            return Err(corrupt(format!(
                "scaler lists {} feature names for {} features",
                names.len(),
                self.mean.len()
            )));
        }
        Ok(())
    }

    fn check_shape(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.mean.len() {
            return Err(SmartRaiseError::FeatureShapeMismatch {
                expected: self.mean.len(),
                actual: x.len(),
            });
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.check_shape(x)?;
        Ok(x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (mean, scale))| (v - mean) / scale)
            .collect())
    }

    fn inverse_transform(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.check_shape(x)?;
        Ok(x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (mean, scale))| v * scale + mean)
            .collect())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }
}

fn corrupt(msg: impl Into<String>) -> SmartRaiseError {
    SmartRaiseError::ArtifactCorrupt(format!("scaler: {}", msg.into()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scaler() -> StandardScaler {
        StandardScaler::new(vec![10.0, 20.0, 30.0], vec![2.0, 4.0, 5.0]).expect("valid")
    }

    #[test]
    fn transform_is_elementwise_affine() {
        let out = scaler().transform(&[12.0, 24.0, 35.0]).expect("transform");
        assert_eq!(out, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn inverse_transform_restores_input() {
        let s = scaler();
        let x = [3.5, -7.25, 1000.0];
        let back = s
            .inverse_transform(&s.transform(&x).expect("transform"))
            .expect("inverse");
        for (a, b) in x.iter().zip(&back) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn wrong_length_reports_expected_and_actual() {
        let err = scaler().transform(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            SmartRaiseError::FeatureShapeMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn zero_scale_rejected() {
        let err = StandardScaler::new(vec![0.0, 0.0], vec![1.0, 0.0]).unwrap_err();
        assert!(matches!(err, SmartRaiseError::ArtifactCorrupt(_)));
    }

    #[test]
    fn mismatched_lengths_rejected() {
        assert!(StandardScaler::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(StandardScaler::new(vec![], vec![]).is_err());
    }

    #[test]
    fn non_finite_mean_rejected() {
        assert!(StandardScaler::new(vec![f64::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn feature_names_must_match_count() {
        let named = scaler().with_feature_names(vec!["a".into(), "b".into()]);
        assert!(named.is_err());

        let named = scaler()
            .with_feature_names(vec!["a".into(), "b".into(), "c".into()])
            .expect("names");
        assert_eq!(named.feature_names().map(<[String]>::len), Some(3));
    }
}
