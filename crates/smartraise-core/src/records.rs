//! # HR Records
//!
//! Derivation of stored documents from one row of the HR spreadsheet.
//!
//! Each source row yields exactly one `Employee` and one `Performance`.
//! The derived scores are heuristics kept as named pure functions so they
//! can be tested and replaced one at a time.

use crate::primitives::{
    ANNUAL_WORK_HOURS, FREQUENT_TRAVEL, FULL_ATTENDANCE, MAX_RATING, MIN_RATING,
    RATING_TO_PERCENT, TRAVEL_ATTENDANCE_PENALTY,
};
use crate::{Result, SmartRaiseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// SOURCE ROW
// =============================================================================

/// The columns of one HR spreadsheet row that ingestion reads.
#[derive(Debug, Clone, PartialEq)]
pub struct HrRow {
    pub emp_number: String,
    pub department: String,
    pub job_role: String,
    pub hourly_rate: f64,
    pub performance_rating: f64,
    pub travel_frequency: String,
    pub relationship_satisfaction: f64,
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Stored in the `employees` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub identifier: String,
    pub department: String,
    pub role: String,
    pub annual_salary: f64,
}

/// Stored in the `performances` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub employee_identifier: String,
    pub kpi_score: f64,
    pub attendance_estimate: f64,
    pub peer_review_score: f64,
    pub observed_at: DateTime<Utc>,
}

// =============================================================================
// DERIVATIONS
// =============================================================================

/// `hourly_rate * 2080`.
pub fn annual_salary(hourly_rate: f64) -> Result<f64> {
    if !hourly_rate.is_finite() || hourly_rate < 0.0 {
        return Err(SmartRaiseError::InvalidRecord(format!(
            "hourly rate must be a non-negative number, got {}",
            hourly_rate
        )));
    }
    Ok(hourly_rate * ANNUAL_WORK_HOURS)
}

fn rating_percent(rating: f64, what: &str) -> Result<f64> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(SmartRaiseError::InvalidRecord(format!(
            "{} must be within {}..={}, got {}",
            what, MIN_RATING, MAX_RATING, rating
        )));
    }
    Ok(rating * RATING_TO_PERCENT)
}

/// Performance rating on the 1-5 scale, as a percentage.
pub fn kpi_score(performance_rating: f64) -> Result<f64> {
    rating_percent(performance_rating, "performance rating")
}

/// 100, or 90 for employees who travel frequently.
#[must_use]
pub fn attendance_estimate(travel_frequency: &str) -> f64 {
    if travel_frequency.trim() == FREQUENT_TRAVEL {
        FULL_ATTENDANCE - TRAVEL_ATTENDANCE_PENALTY
    } else {
        FULL_ATTENDANCE
    }
}

/// Relationship satisfaction on the 1-5 scale, as a percentage.
pub fn peer_review_score(relationship_satisfaction: f64) -> Result<f64> {
    rating_percent(relationship_satisfaction, "relationship satisfaction")
}

/// Derive both documents for one row.
///
/// `observed_at` is shared by every row of a run.
pub fn derive_records(row: &HrRow, observed_at: DateTime<Utc>) -> Result<(Employee, Performance)> {
    if row.emp_number.trim().is_empty() {
        return Err(SmartRaiseError::InvalidRecord(
            "employee number is empty".to_string(),
        ));
    }

    let employee = Employee {
        identifier: row.emp_number.clone(),
        department: row.department.clone(),
        role: row.job_role.clone(),
        annual_salary: annual_salary(row.hourly_rate)?,
    };
    let performance = Performance {
        employee_identifier: row.emp_number.clone(),
        kpi_score: kpi_score(row.performance_rating)?,
        attendance_estimate: attendance_estimate(&row.travel_frequency),
        peer_review_score: peer_review_score(row.relationship_satisfaction)?,
        observed_at,
    };
    Ok((employee, performance))
}

// =============================================================================
// TESTS
// =============================================================================
