//! # Ingestor Module
//!
//! Full-replace ingestion of the HR spreadsheet, followed by a smoke-test
//! prediction.
//!
//! The job is a fixed sequence of four store calls:
//! 1. delete all `employees`
//! 2. delete all `performances`
//! 3. insert all employees
//! 4. insert all performances
//!
//! Every row is derived before step 1, so a bad row leaves both collections
//! untouched. A store failure in steps 1-4 aborts the job with no rollback:
//! the collections stay in whatever state the last successful call left.

use crate::loader;
use crate::primitives::{
    DEFAULT_FEATURES, FEATURE_ANNUAL_SALARY, FEATURE_ATTENDANCE, FEATURE_KPI, FEATURE_PEER_REVIEW,
};
use crate::records::{Employee, HrRow, Performance, derive_records};
use crate::source;
use crate::storage::{Collection, DocumentStore};
use crate::{Prediction, Result, SmartRaiseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// SMOKE TEST
// =============================================================================

/// How the post-ingest smoke test is run.
#[derive(Debug, Clone, PartialEq)]
pub enum SmokeTest {
    /// Do not run it; the reason is logged and reported.
    Skip(String),
    /// Load these artifacts and predict from the first stored performance.
    Run {
        model: PathBuf,
        scaler: PathBuf,
        /// Record fields fed to the model, in order.
        features: Vec<String>,
    },
}

impl SmokeTest {
    /// Run with the default feature order.
    pub fn with_artifacts(model: impl Into<PathBuf>, scaler: impl Into<PathBuf>) -> Self {
        Self::Run {
            model: model.into(),
            scaler: scaler.into(),
            features: DEFAULT_FEATURES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Result of the smoke test. Never fails the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SmokeTestOutcome {
    Passed {
        features: Vec<f64>,
        prediction: Prediction,
    },
    Failed {
        reason: String,
    },
    Skipped {
        reason: String,
    },
}

impl SmokeTestOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// Look up one named feature on a performance record and its employee.
pub fn resolve_feature(
    name: &str,
    performance: &Performance,
    employee: Option<&Employee>,
) -> Result<f64> {
    match name {
        FEATURE_KPI => Ok(performance.kpi_score),
        FEATURE_ATTENDANCE => Ok(performance.attendance_estimate),
        FEATURE_PEER_REVIEW => Ok(performance.peer_review_score),
        FEATURE_ANNUAL_SALARY => employee.map(|e| e.annual_salary).ok_or_else(|| {
            SmartRaiseError::Config(format!(
                "feature '{}' needs employee '{}', which was not ingested",
                name, performance.employee_identifier
            ))
        }),
        other => Err(SmartRaiseError::Config(format!(
            "unknown feature '{}'; expected one of {}, {}, {}, {}",
            other, FEATURE_KPI, FEATURE_ATTENDANCE, FEATURE_PEER_REVIEW, FEATURE_ANNUAL_SALARY
        ))),
    }
}

fn smoke_features(
    names: &[String],
    performance: &Performance,
    employees: &[Employee],
) -> Result<Vec<f64>> {
    let employee = employees
        .iter()
        .find(|e| e.identifier == performance.employee_identifier);
    names
        .iter()
        .map(|name| resolve_feature(name, performance, employee))
        .collect()
}

fn run_smoke_test<S: DocumentStore>(
    store: &S,
    employees: &[Employee],
    model: &Path,
    scaler: &Path,
    names: &[String],
) -> Result<(Vec<f64>, Prediction)> {
    let artifacts = loader::load(model, scaler)?;
    artifacts.check_feature_order(names)?;
    let pipeline = artifacts.into_pipeline();

    let performance = store
        .find_first::<Performance>()?
        .ok_or_else(|| SmartRaiseError::InvalidRecord("no performance records stored".into()))?;
    let features = smoke_features(names, &performance, employees)?;
    let prediction = pipeline.predict(&features)?;
    Ok((features, prediction))
}

// =============================================================================
// REPORT
// =============================================================================

/// What an ingestion run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Employees written.
    pub employees: u64,
    /// Performances written.
    pub performances: u64,
    /// Employees removed by the full replace.
    pub deleted_employees: u64,
    /// Performances removed by the full replace.
    pub deleted_performances: u64,
    /// Timestamp stamped on every performance of this run.
    pub observed_at: DateTime<Utc>,
    pub smoke_test: SmokeTestOutcome,
}

// =============================================================================
// INGESTOR
// =============================================================================

/// The ingestion job.
#[derive(Debug, Clone)]
pub struct Ingestor {
    smoke_test: SmokeTest,
}

impl Ingestor {
    #[must_use]
    pub fn new(smoke_test: SmokeTest) -> Self {
        Self { smoke_test }
    }

    /// Derive every row, failing on the first invalid one.
    pub fn derive_all(
        rows: &[HrRow],
        observed_at: DateTime<Utc>,
    ) -> Result<(Vec<Employee>, Vec<Performance>)> {
        let mut employees = Vec::with_capacity(rows.len());
        let mut performances = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let (employee, performance) =
                derive_records(row, observed_at).map_err(|e| match e {
                    SmartRaiseError::InvalidRecord(msg) => SmartRaiseError::InvalidRecord(
                        format!("record {} ({}): {}", i + 1, row.emp_number, msg),
                    ),
                    other => other,
                })?;
            employees.push(employee);
            performances.push(performance);
        }
        Ok((employees, performances))
    }

    /// Replace both collections with the given records.
    ///
    /// Returns `(deleted_employees, deleted_performances)`.
    pub fn replace_all<S: DocumentStore>(
        store: &mut S,
        employees: &[Employee],
        performances: &[Performance],
    ) -> Result<(u64, u64)> {
        let deleted_employees = store.delete_all(Collection::Employees)?;
        let deleted_performances = store.delete_all(Collection::Performances)?;
        store.insert_many(employees)?;
        store.insert_many(performances)?;
        Ok((deleted_employees, deleted_performances))
    }

    /// Ingest already-parsed rows.
    pub fn ingest_rows<S: DocumentStore>(
        &self,
        store: &mut S,
        rows: &[HrRow],
        observed_at: DateTime<Utc>,
    ) -> Result<IngestReport> {
        let (employees, performances) = Self::derive_all(rows, observed_at)?;
        let (deleted_employees, deleted_performances) =
            Self::replace_all(store, &employees, &performances)?;

        tracing::info!(
            employees = employees.len(),
            performances = performances.len(),
            deleted_employees,
            deleted_performances,
            "Collections replaced"
        );

        let smoke_test = self.smoke_test(store, &employees);

        Ok(IngestReport {
            employees: employees.len() as u64,
            performances: performances.len() as u64,
            deleted_employees,
            deleted_performances,
            observed_at,
            smoke_test,
        })
    }

    /// Read `source_path` and ingest it, stamping every record with now.
    pub fn run<S: DocumentStore>(&self, store: &mut S, source_path: &Path) -> Result<IngestReport> {
        let rows = source::read_rows(source_path)?;
        tracing::info!(source = %source_path.display(), rows = rows.len(), "Source loaded");
        self.ingest_rows(store, &rows, Utc::now())
    }

    fn smoke_test<S: DocumentStore>(&self, store: &S, employees: &[Employee]) -> SmokeTestOutcome {
        match &self.smoke_test {
            SmokeTest::Skip(reason) => {
                tracing::info!(reason = %reason, "Smoke test skipped");
                SmokeTestOutcome::Skipped {
                    reason: reason.clone(),
                }
            }
            SmokeTest::Run {
                model,
                scaler,
                features,
            } => match run_smoke_test(store, employees, model, scaler, features) {
                Ok((features, prediction)) => {
                    tracing::info!(?features, %prediction, "Smoke test passed");
                    SmokeTestOutcome::Passed {
                        features,
                        prediction,
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Smoke test failed; ingested data kept");
                    SmokeTestOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            },
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
