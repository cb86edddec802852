//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use crate::config::PredictionShape;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smartraise_core::{OutputKind, PipelineInfo, Prediction, SmartRaiseError};

/// Text returned by `GET /`.
pub const WELCOME_TEXT: &str = "Welcome to the Employee Performance Prediction API!";

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// MODEL INFO RESPONSE
// =============================================================================

/// Description of the loaded artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub kind: String,
    pub output: OutputKind,
    pub n_features: usize,
    pub feature_names: Option<Vec<String>>,
    pub prediction_shape: PredictionShape,
    pub model_fingerprint: String,
    pub scaler_fingerprint: String,
}

impl ModelInfoResponse {
    #[must_use]
    pub fn new(info: &PipelineInfo, prediction_shape: PredictionShape) -> Self {
        Self {
            kind: info.kind.clone(),
            output: info.output,
            n_features: info.n_features,
            feature_names: info.feature_names.clone(),
            prediction_shape,
            model_fingerprint: info.model_fingerprint.clone(),
            scaler_fingerprint: info.scaler_fingerprint.clone(),
        }
    }
}

// =============================================================================
// PREDICT REQUEST/RESPONSE
// =============================================================================

/// Prediction request.
///
/// `features` is either a flat list of numbers or a list holding exactly
/// one such list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: Value,
}

impl PredictRequest {
    /// Build a request from a flat feature vector.
    #[must_use]
    pub fn flat(features: &[f64]) -> Self {
        Self {
            features: Value::from(features.to_vec()),
        }
    }

    /// Normalise `features` into one vector.
    ///
    /// Returns `MalformedRequest` for anything that is not a list of numbers
    /// or a single nested list of numbers.
    pub fn feature_vector(&self) -> Result<Vec<f64>, SmartRaiseError> {
        let Value::Array(items) = &self.features else {
            return Err(SmartRaiseError::MalformedRequest(
                "'features' must be a list of numbers".to_string(),
            ));
        };

        let row = match items.as_slice() {
            [Value::Array(inner)] => inner,
            rows if rows.iter().any(Value::is_array) => {
                return Err(SmartRaiseError::MalformedRequest(format!(
                    "'features' must hold exactly one row, got {}",
                    rows.len()
                )));
            }
            _ => items,
        };

        row.iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_f64().ok_or_else(|| {
                    SmartRaiseError::MalformedRequest(format!("feature {} is not a number", i))
                })
            })
            .collect()
    }
}

/// `prediction` is a bare value or a one-element list, per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionValue {
    Scalar(Prediction),
    List(Vec<Prediction>),
}

/// Prediction response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: PredictionValue,
}

impl PredictResponse {
    #[must_use]
    pub fn new(prediction: Prediction, shape: PredictionShape) -> Self {
        let prediction = match shape {
            PredictionShape::Scalar => PredictionValue::Scalar(prediction),
            PredictionShape::List => PredictionValue::List(vec![prediction]),
        };
        Self { prediction }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Error codes carried in [`ErrorResponse::error`].
pub mod codes {
    pub const MALFORMED_REQUEST: &str = "malformed_request";
    pub const FEATURE_SHAPE_MISMATCH: &str = "feature_shape_mismatch";
    pub const UNSUPPORTED_MEDIA_TYPE: &str = "unsupported_media_type";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const TIMEOUT: &str = "timeout";
    pub const INTERNAL: &str = "internal";
}

/// The one error body every endpoint uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub expected: Option<usize>,
    pub actual: Option<usize>,
}

impl ErrorResponse {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: code.to_string(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(codes::MALFORMED_REQUEST, message)
    }

    #[must_use]
    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(codes::UNSUPPORTED_MEDIA_TYPE, message)
    }

    #[must_use]
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(codes::PAYLOAD_TOO_LARGE, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(codes::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(codes::RATE_LIMITED, message)
    }

    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(codes::TIMEOUT, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, message)
    }

    #[must_use]
    pub fn shape_mismatch(expected: usize, actual: usize) -> Self {
        Self {
            error: codes::FEATURE_SHAPE_MISMATCH.to_string(),
            message: format!("expected {} features, got {}", expected, actual),
            expected: Some(expected),
            actual: Some(actual),
        }
    }
}

impl From<&SmartRaiseError> for ErrorResponse {
    fn from(err: &SmartRaiseError) -> Self {
        match err {
            SmartRaiseError::FeatureShapeMismatch { expected, actual } => {
                Self::shape_mismatch(*expected, *actual)
            }
            SmartRaiseError::MalformedRequest(msg) => Self::malformed(msg.clone()),
            // Internal details stay in the server log.
            _ => Self::internal("prediction failed"),
        }
    }
}
