//! # Core Type Definitions
//!
//! This module contains the shared types of the SmartRaise core:
//! - Prediction output (`Prediction`, `OutputKind`)
//! - Error types (`SmartRaiseError`, `Result`)
//!
//! ## Determinism Guarantees
//!
//! A `Prediction` is a plain value: it carries no reference to the model that
//! produced it, so equal inputs over equal artifacts compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// PREDICTION
// =============================================================================

/// The kind of value a model produces.
///
/// Fixed by the model family at load time; never varies by request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// An integer class label.
    Class,
    /// A continuous score.
    Score,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Score => write!(f, "score"),
        }
    }
}

/// A single model output.
///
/// Serializes as a bare JSON number: `3` for a class, `3.25` for a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    /// Class label chosen by a classifier.
    Class(i64),
    /// Continuous value produced by a regressor.
    Score(f64),
}

impl Prediction {
    /// The kind of this prediction.
    #[must_use]
    pub const fn kind(&self) -> OutputKind {
        match self {
            Self::Class(_) => OutputKind::Class,
            Self::Score(_) => OutputKind::Score,
        }
    }

    /// The prediction as a float, for logging and tolerance checks.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Class(label) => label as f64,
            Self::Score(score) => score,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(label) => write!(f, "{}", label),
            Self::Score(score) => write!(f, "{:.2}", score),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the SmartRaise system.
///
/// Three failure domains:
/// - startup (`ArtifactNotFound`, `ArtifactCorrupt`, `Config`): fatal, the
///   service must not come up
/// - request (`FeatureShapeMismatch`, `MalformedRequest`): reported to the
///   caller, the service keeps serving
/// - ingestion (`IngestionSourceUnreadable`, `IngestionWriteFailed`,
///   `InvalidRecord`): the batch is aborted, no rollback
#[derive(Debug, Error)]
pub enum SmartRaiseError {
    /// An artifact path does not resolve to a readable file.
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// An artifact could not be decoded or failed validation.
    #[error("Artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    /// The feature vector length differs from the fitted feature count.
    #[error("Feature shape mismatch: expected {expected} features, got {actual}")]
    FeatureShapeMismatch { expected: usize, actual: usize },

    /// The request payload violates the input contract.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The ingestion source could not be opened or parsed.
    #[error("Ingestion source unreadable: {0}")]
    IngestionSourceUnreadable(String),

    /// A document store operation failed during ingestion.
    #[error("Ingestion write failed: {0}")]
    IngestionWriteFailed(String),

    /// A source row violates a derivation precondition.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A lookup over the document store matched nothing.
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Configuration could not be read or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl SmartRaiseError {
    /// Whether this error is caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::FeatureShapeMismatch { .. } | Self::MalformedRequest(_)
        )
    }

    /// Whether this error must prevent the service from starting.
    #[must_use]
    pub const fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::ArtifactNotFound(_) | Self::ArtifactCorrupt(_) | Self::Config(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SmartRaiseError>;

// =============================================================================
// TESTS
// =============================================================================
