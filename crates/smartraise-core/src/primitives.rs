//! # Fixed Primitives
//!
//! Compile-time constants for the SmartRaise core.
//!
//! These values are part of the external contract: artifact headers, the
//! spreadsheet schema, and the heuristics used to derive HR records. They are
//! immutable at runtime.

// =============================================================================
// ARTIFACT FORMAT
// =============================================================================

/// Magic bytes for a binary scaler artifact.
pub const SCALER_MAGIC: &[u8; 4] = b"SRSC";

/// Magic bytes for a binary model artifact.
pub const MODEL_MAGIC: &[u8; 4] = b"SRMD";

/// Current artifact format version (binary and JSON).
///
/// Increment this when making breaking changes to the artifact layout.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the binary artifact header: 4 magic bytes + 1 version byte.
pub const HEADER_LEN: usize = 5;

/// Maximum artifact file size (64 MB).
///
/// Checked before any decoding is attempted.
pub const MAX_ARTIFACT_SIZE: u64 = 64 * 1024 * 1024;

/// Maximum number of features a scaler may declare.
pub const MAX_FEATURES: usize = 4096;

/// Maximum number of nodes in a single decision tree.
pub const MAX_TREE_NODES: usize = 1 << 20;

// =============================================================================
// DERIVATION HEURISTICS
// =============================================================================

/// Working hours per year used to annualise an hourly rate (40 h × 52 weeks).
pub const ANNUAL_WORK_HOURS: f64 = 2080.0;

/// Multiplier mapping a 1–5 rating onto a 0–100 percentage.
pub const RATING_TO_PERCENT: f64 = 20.0;

/// Attendance points subtracted for frequent travellers.
pub const TRAVEL_ATTENDANCE_PENALTY: f64 = 10.0;

/// Baseline attendance percentage.
pub const FULL_ATTENDANCE: f64 = 100.0;

/// Travel-frequency value that triggers the attendance penalty.
pub const FREQUENT_TRAVEL: &str = "Travel_Frequently";

/// Lowest accepted rating on the 1–5 HR scales.
pub const MIN_RATING: f64 = 1.0;

/// Highest accepted rating on the 1–5 HR scales.
pub const MAX_RATING: f64 = 5.0;

// =============================================================================
// SOURCE SCHEMA
// =============================================================================

/// Spreadsheet column holding the employee identifier.
pub const COL_EMP_NUMBER: &str = "EmpNumber";
/// Spreadsheet column holding the department.
pub const COL_DEPARTMENT: &str = "EmpDepartment";
/// Spreadsheet column holding the job role.
pub const COL_JOB_ROLE: &str = "EmpJobRole";
/// Spreadsheet column holding the hourly rate.
pub const COL_HOURLY_RATE: &str = "EmpHourlyRate";
/// Spreadsheet column holding the 1–5 performance rating.
pub const COL_PERFORMANCE_RATING: &str = "PerformanceRating";
/// Spreadsheet column holding the travel frequency label.
pub const COL_TRAVEL_FREQUENCY: &str = "BusinessTravelFrequency";
/// Spreadsheet column holding the 1–5 relationship satisfaction.
pub const COL_RELATIONSHIP_SATISFACTION: &str = "EmpRelationshipSatisfaction";

/// Every column the ingestion job requires, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_EMP_NUMBER,
    COL_DEPARTMENT,
    COL_JOB_ROLE,
    COL_HOURLY_RATE,
    COL_PERFORMANCE_RATING,
    COL_TRAVEL_FREQUENCY,
    COL_RELATIONSHIP_SATISFACTION,
];

/// Maximum number of rows accepted from a single source.
pub const MAX_SOURCE_ROWS: usize = 1_000_000;

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Collection name for employee documents.
pub const EMPLOYEES: &str = "employees";

/// Collection name for performance documents.
pub const PERFORMANCES: &str = "performances";

// =============================================================================
// SMOKE-TEST FEATURES
// =============================================================================

/// Performance field: KPI score.
pub const FEATURE_KPI: &str = "kpiScore";

/// Performance field: attendance estimate.
pub const FEATURE_ATTENDANCE: &str = "attendanceEstimate";

/// Performance field: peer review score.
pub const FEATURE_PEER_REVIEW: &str = "peerReviewScore";

/// Employee field: annual salary.
pub const FEATURE_ANNUAL_SALARY: &str = "annualSalary";

/// Feature order used when none is configured.
pub const DEFAULT_FEATURES: [&str; 3] = [FEATURE_KPI, FEATURE_ATTENDANCE, FEATURE_PEER_REVIEW];
