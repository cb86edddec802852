//! # Artifact Formats
//!
//! Versioned, language-neutral serialization for the two pipeline artifacts.
//!
//! Two encodings are accepted and detected by content:
//!
//! - **Binary**: Header (5 bytes) + postcard payload.
//!   - 4 bytes: Magic (`SRSC` scaler, `SRMD` model)
//!   - 1 byte: Version
//! - **JSON**: `{"format_version": 1, ...}`; models are tagged by `"kind"`.
//!
//! All decoding failures map to `ArtifactCorrupt`. Decoded parameters are
//! validated before being returned, so a successfully decoded artifact is
//! always usable.

use crate::model::{LinearRegression, LogisticRegression, ModelSpec, RandomForest};
use crate::primitives::{FORMAT_VERSION, HEADER_LEN, MODEL_MAGIC, SCALER_MAGIC};
use crate::scaler::StandardScaler;
use crate::{Result, SmartRaiseError};
use serde::{Deserialize, Serialize};

// =============================================================================
// FILE HEADER
// =============================================================================

/// The binary header preceding every postcard payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl ArtifactHeader {
    /// Create a header for the given magic with the current format version.
    #[must_use]
    pub const fn new(magic: &[u8; 4]) -> Self {
        Self {
            magic: *magic,
            version: FORMAT_VERSION,
        }
    }

    /// Validate the header against the expected magic.
    pub fn validate(&self, expected: &[u8; 4]) -> Result<()> {
        if &self.magic != expected {
            return Err(SmartRaiseError::ArtifactCorrupt(format!(
                "invalid magic bytes {:?} (expected {:?})",
                String::from_utf8_lossy(&self.magic),
                String::from_utf8_lossy(expected)
            )));
        }
        if self.version != FORMAT_VERSION {
            return Err(SmartRaiseError::ArtifactCorrupt(format!(
                "unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SmartRaiseError::ArtifactCorrupt(
                "header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

// =============================================================================
// ENCODING DETECTION
// =============================================================================

/// The on-disk encoding of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Binary,
    Json,
}

impl Encoding {
    /// Detect the encoding: JSON if the first non-whitespace byte is `{`.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Self::Json,
            _ => Self::Binary,
        }
    }
}

// =============================================================================
// JSON ENVELOPES
// =============================================================================

#[derive(Serialize, Deserialize)]
struct JsonScaler {
    format_version: u8,
    #[serde(flatten)]
    scaler: StandardScaler,
}

/// JSON view of [`ModelSpec`], tagged by `kind`.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TaggedModel {
    LinearRegression(LinearRegression),
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl From<TaggedModel> for ModelSpec {
    fn from(tagged: TaggedModel) -> Self {
        match tagged {
            TaggedModel::LinearRegression(m) => Self::LinearRegression(m),
            TaggedModel::LogisticRegression(m) => Self::LogisticRegression(m),
            TaggedModel::RandomForest(m) => Self::RandomForest(m),
        }
    }
}

impl From<&ModelSpec> for TaggedModel {
    fn from(spec: &ModelSpec) -> Self {
        match spec {
            ModelSpec::LinearRegression(m) => Self::LinearRegression(m.clone()),
            ModelSpec::LogisticRegression(m) => Self::LogisticRegression(m.clone()),
            ModelSpec::RandomForest(m) => Self::RandomForest(m.clone()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct JsonModel {
    format_version: u8,
    #[serde(flatten)]
    model: TaggedModel,
}

fn check_json_version(version: u8) -> Result<()> {
    if version != FORMAT_VERSION {
        return Err(SmartRaiseError::ArtifactCorrupt(format!(
            "unsupported format_version: {} (expected {})",
            version, FORMAT_VERSION
        )));
    }
    Ok(())
}

// =============================================================================
// BINARY HELPERS
// =============================================================================

fn to_binary<T: Serialize>(magic: &[u8; 4], value: &T) -> Result<Vec<u8>> {
    let payload = postcard::to_stdvec(value)
        .map_err(|e| SmartRaiseError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&ArtifactHeader::new(magic).to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

fn from_binary<T: for<'de> Deserialize<'de>>(magic: &[u8; 4], bytes: &[u8]) -> Result<T> {
    // Validate header BEFORE processing payload
    let header = ArtifactHeader::from_bytes(bytes)?;
    header.validate(magic)?;

    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        SmartRaiseError::ArtifactCorrupt(format!("failed to decode payload: {}", e))
    })
}

// =============================================================================
// SCALER
// =============================================================================

/// Serialize a scaler to the binary encoding.
pub fn scaler_to_bytes(scaler: &StandardScaler) -> Result<Vec<u8>> {
    to_binary(SCALER_MAGIC, scaler)
}

/// Serialize a scaler to the JSON encoding.
pub fn scaler_to_json(scaler: &StandardScaler) -> Result<Vec<u8>> {
    let doc = JsonScaler {
        format_version: FORMAT_VERSION,
        scaler: scaler.clone(),
    };
    serde_json::to_vec_pretty(&doc).map_err(|e| SmartRaiseError::SerializationError(e.to_string()))
}

/// Decode and validate a scaler from either encoding.
pub fn scaler_from_bytes(bytes: &[u8]) -> Result<StandardScaler> {
    let scaler = match Encoding::detect(bytes) {
        Encoding::Binary => from_binary::<StandardScaler>(SCALER_MAGIC, bytes)?,
        Encoding::Json => {
            let doc: JsonScaler = serde_json::from_slice(bytes).map_err(|e| {
                SmartRaiseError::ArtifactCorrupt(format!("invalid scaler JSON: {}", e))
            })?;
            check_json_version(doc.format_version)?;
            doc.scaler
        }
    };
    scaler.validate()?;
    Ok(scaler)
}

// =============================================================================
// MODEL
// =============================================================================

/// Serialize a model to the binary encoding.
pub fn model_to_bytes(model: &ModelSpec) -> Result<Vec<u8>> {
    to_binary(MODEL_MAGIC, model)
}

/// Serialize a model to the JSON encoding.
pub fn model_to_json(model: &ModelSpec) -> Result<Vec<u8>> {
    let doc = JsonModel {
        format_version: FORMAT_VERSION,
        model: TaggedModel::from(model),
    };
    serde_json::to_vec_pretty(&doc).map_err(|e| SmartRaiseError::SerializationError(e.to_string()))
}

/// Decode and validate a model from either encoding.
pub fn model_from_bytes(bytes: &[u8]) -> Result<ModelSpec> {
    let model = match Encoding::detect(bytes) {
        Encoding::Binary => from_binary::<ModelSpec>(MODEL_MAGIC, bytes)?,
        Encoding::Json => {
            let doc: JsonModel = serde_json::from_slice(bytes).map_err(|e| {
                SmartRaiseError::ArtifactCorrupt(format!("invalid model JSON: {}", e))
            })?;
            check_json_version(doc.format_version)?;
            ModelSpec::from(doc.model)
        }
    };
    model.validate()?;
    Ok(model)
}

// =============================================================================
// FINGERPRINT
// =============================================================================

/// Content fingerprint of raw artifact bytes (BLAKE3, hex).
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Content fingerprint of raw artifact bytes (FNV-1a 64, hex).
#[cfg(not(feature = "crypto-hash"))]
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let hash = bytes
        .iter()
        .fold(OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(PRIME));
    format!("{:016x}", hash)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DecisionTree, ForestTask, LEAF};

    fn scaler() -> StandardScaler {
        StandardScaler::new(vec![10.0, 20.0], vec![2.0, 4.0])
            .expect("valid")
            .with_feature_names(vec!["kpiScore".into(), "peerReviewScore".into()])
            .expect("names")
    }

    fn forest() -> ModelSpec {
        ModelSpec::RandomForest(RandomForest {
            task: ForestTask::Classification {
                classes: vec![2, 3],
            },
            n_features: 2,
            trees: vec![DecisionTree {
                feature: vec![1, -2, -2],
                threshold: vec![0.25, -2.0, -2.0],
                left: vec![1, LEAF, LEAF],
                right: vec![2, LEAF, LEAF],
                value: vec![vec![5.0, 5.0], vec![9.0, 1.0], vec![0.0, 4.0]],
            }],
        })
    }

    #[test]
    fn header_roundtrip() {
        let header = ArtifactHeader::new(SCALER_MAGIC);
        let restored = ArtifactHeader::from_bytes(&header.to_bytes()).expect("parse");
        assert_eq!(restored, header);
        assert!(restored.validate(SCALER_MAGIC).is_ok());
        assert!(restored.validate(MODEL_MAGIC).is_err());
    }

    #[test]
    fn binary_and_json_decode_to_same_scaler() {
        let s = scaler();
        let from_bin = scaler_from_bytes(&scaler_to_bytes(&s).expect("bin")).expect("decode");
        let from_json = scaler_from_bytes(&scaler_to_json(&s).expect("json")).expect("decode");
        assert_eq!(from_bin, s);
        assert_eq!(from_json, s);
    }

    #[test]
    fn binary_and_json_decode_to_same_model() {
        let m = forest();
        let from_bin = model_from_bytes(&model_to_bytes(&m).expect("bin")).expect("decode");
        let from_json = model_from_bytes(&model_to_json(&m).expect("json")).expect("decode");
        assert_eq!(from_bin, m);
        assert_eq!(from_json, m);
    }

    #[test]
    fn hand_written_json_model_is_accepted() {
        let json = br#"{
            "format_version": 1,
            "kind": "linear_regression",
            "coefficients": [1.0, 1.0, 1.0],
            "intercept": 0.0
        }"#;
        let model = model_from_bytes(json).expect("decode");
        assert_eq!(model.kind_name(), "linear_regression");
    }

    #[test]
    fn hand_written_json_scaler_without_names() {
        let json = br#"{"format_version": 1, "mean": [10, 20, 30], "scale": [2, 4, 5]}"#;
        let scaler = scaler_from_bytes(json).expect("decode");
        assert_eq!(scaler.mean, vec![10.0, 20.0, 30.0]);
        assert!(scaler.feature_names.is_none());
    }

    #[test]
    fn unknown_kind_is_corrupt() {
        let json = br#"{"format_version": 1, "kind": "svm", "support": []}"#;
        assert!(matches!(
            model_from_bytes(json),
            Err(SmartRaiseError::ArtifactCorrupt(_))
        ));
    }

    #[test]
    fn future_version_is_corrupt() {
        let json = br#"{"format_version": 9, "mean": [1], "scale": [1]}"#;
        assert!(scaler_from_bytes(json).is_err());

        let mut bytes = scaler_to_bytes(&scaler()).expect("bin");
        bytes[4] = 9;
        assert!(scaler_from_bytes(&bytes).is_err());
    }

    #[test]
    fn model_bytes_are_not_a_scaler() {
        let bytes = model_to_bytes(&forest()).expect("bin");
        assert!(matches!(
            scaler_from_bytes(&bytes),
            Err(SmartRaiseError::ArtifactCorrupt(_))
        ));
    }

    #[test]
    fn truncated_payload_is_corrupt() {
        let bytes = model_to_bytes(&forest()).expect("bin");
        assert!(model_from_bytes(&bytes[..bytes.len() / 2]).is_err());
        assert!(model_from_bytes(&bytes[..3]).is_err());
    }

    #[test]
    fn decoded_parameters_are_validated() {
        let json = br#"{"format_version": 1, "mean": [1, 2], "scale": [1, 0]}"#;
        assert!(scaler_from_bytes(json).is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
    }
}
