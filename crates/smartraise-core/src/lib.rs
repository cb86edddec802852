//! # smartraise-core
//!
//! The deterministic inference core for SmartRaise.
//!
//! This crate turns a fitted feature scaler and a fitted model into a pure
//! prediction function, and owns the offline job that loads HR records into
//! the document store.
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - Artifacts are parameter files, never executable objects
//! - Loaded artifacts are immutable; predictions depend only on the
//!   artifacts and the input vector
//! - All arithmetic is `f64`

// =============================================================================
// MODULES
// =============================================================================

pub mod formats;
pub mod ingestor;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod primitives;
pub mod query;
pub mod records;
pub mod scaler;
pub mod source;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{OutputKind, Prediction, Result, SmartRaiseError};

// =============================================================================
// RE-EXPORTS: Inference
// =============================================================================

pub use loader::{Artifacts, load, load_model, load_scaler};
pub use model::{
    DecisionTree, ForestTask, LinearRegression, LogisticRegression, Model, ModelSpec,
    RandomForest,
};
pub use pipeline::{InferencePipeline, PipelineInfo};
pub use scaler::{Scaler, StandardScaler};

// =============================================================================
// RE-EXPORTS: Ingestion
// =============================================================================

pub use ingestor::{IngestReport, Ingestor, SmokeTest, SmokeTestOutcome};
pub use query::{
    DepartmentSummary, department_summary, find_employee, list_employees, performance_history,
};
pub use records::{Employee, HrRow, Performance};
pub use storage::{Collection, Document, DocumentStore, MemoryStore, RedbStore};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    ArtifactHeader, Encoding, fingerprint, model_from_bytes, model_to_bytes, model_to_json,
    scaler_from_bytes, scaler_to_bytes, scaler_to_json,
};
