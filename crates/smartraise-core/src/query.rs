//! # Query Module
//!
//! Read-side lookups over the ingested collections.
//!
//! - Employees: list all, fetch one by identifier
//! - Performances: history of one employee, in insertion order
//! - Department summary: mean scores over the department's performance records
//!
//! Every lookup is a full scan through [`DocumentStore::find_all`]; the
//! collections hold one document per spreadsheet row.

use crate::records::{Employee, Performance};
use crate::storage::DocumentStore;
use crate::{Result, SmartRaiseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// EMPLOYEES
// =============================================================================

/// Every employee, in insertion order.
pub fn list_employees<S: DocumentStore>(store: &S) -> Result<Vec<Employee>> {
    store.find_all::<Employee>()
}

/// The first employee with `identifier`.
///
/// # Errors
///
/// `RecordNotFound` if no employee carries that identifier.
pub fn find_employee<S: DocumentStore>(store: &S, identifier: &str) -> Result<Employee> {
    store
        .find_all::<Employee>()?
        .into_iter()
        .find(|e| e.identifier == identifier)
        .ok_or_else(|| SmartRaiseError::RecordNotFound(format!("employee '{}'", identifier)))
}

// =============================================================================
// PERFORMANCE HISTORY
// =============================================================================

/// Performance records of one employee, oldest first.
///
/// An unknown identifier yields an empty history, not an error.
pub fn performance_history<S: DocumentStore>(
    store: &S,
    identifier: &str,
) -> Result<Vec<Performance>> {
    Ok(store
        .find_all::<Performance>()?
        .into_iter()
        .filter(|p| p.employee_identifier == identifier)
        .collect())
}

// =============================================================================
// DEPARTMENT SUMMARY
// =============================================================================

/// Mean scores over every performance record of a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub department: String,
    pub avg_kpi_score: f64,
    pub avg_attendance_estimate: f64,
    pub avg_peer_review_score: f64,
    /// Distinct employees with at least one record.
    pub employees: u64,
    /// Performance records averaged.
    pub records: u64,
}

/// Summarise the performance records whose employee belongs to `department`.
///
/// Department names match exactly.
///
/// # Errors
///
/// `RecordNotFound` if the department has no performance records.
pub fn department_summary<S: DocumentStore>(
    store: &S,
    department: &str,
) -> Result<DepartmentSummary> {
    let members: BTreeSet<String> = store
        .find_all::<Employee>()?
        .into_iter()
        .filter(|e| e.department == department)
        .map(|e| e.identifier)
        .collect();

    let mut kpi = 0.0;
    let mut attendance = 0.0;
    let mut peer = 0.0;
    let mut records = 0u64;
    let mut seen = BTreeSet::new();
    for perf in store.find_all::<Performance>()? {
        if !members.contains(&perf.employee_identifier) {
            continue;
        }
        kpi += perf.kpi_score;
        attendance += perf.attendance_estimate;
        peer += perf.peer_review_score;
        records += 1;
        seen.insert(perf.employee_identifier);
    }

    if records == 0 {
        return Err(SmartRaiseError::RecordNotFound(format!(
            "no performance data for department '{}'",
            department
        )));
    }

    let n = records as f64;
    Ok(DepartmentSummary {
        department: department.to_string(),
        avg_kpi_score: kpi / n,
        avg_attendance_estimate: attendance / n,
        avg_peer_review_score: peer / n,
        employees: seen.len() as u64,
        records,
    })
}

// =============================================================================
// TESTS
// =============================================================================
