//! # Scenario Tiers (S0-S3)
//!
//! End-to-end scenarios over real files.
//!
//! ## Tiers
//! - S0: Artifact loading
//! - S1: Inference
//! - S2: Ingestion from a spreadsheet into redb, and reading it back
//! - S3: Ingestion failure modes

#![allow(clippy::unwrap_used)]

use smartraise_core::{
    Artifacts, Collection, DocumentStore, Employee, Ingestor, LinearRegression, ModelSpec,
    Performance, Prediction, RedbStore, SmartRaiseError, SmokeTest, SmokeTestOutcome,
    StandardScaler, department_summary, find_employee, list_employees, load, model_to_bytes,
    model_to_json, performance_history, scaler_to_bytes, scaler_to_json,
};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn reference_scaler() -> StandardScaler {
    StandardScaler::new(vec![10.0, 20.0, 30.0], vec![2.0, 4.0, 5.0]).expect("scaler")
}

fn summing_model() -> ModelSpec {
    ModelSpec::LinearRegression(LinearRegression {
        coefficients: vec![1.0, 1.0, 1.0],
        intercept: 0.0,
    })
}

fn write_artifacts(dir: &Path, binary: bool) -> (PathBuf, PathBuf) {
    let (model_path, scaler_path, model, scaler) = if binary {
        (
            dir.join("model.srmd"),
            dir.join("scaler.srsc"),
            model_to_bytes(&summing_model()).expect("model"),
            scaler_to_bytes(&reference_scaler()).expect("scaler"),
        )
    } else {
        (
            dir.join("model.json"),
            dir.join("scaler.json"),
            model_to_json(&summing_model()).expect("model"),
            scaler_to_json(&reference_scaler()).expect("scaler"),
        )
    };
    std::fs::write(&model_path, model).expect("write model");
    std::fs::write(&scaler_path, scaler).expect("write scaler");
    (model_path, scaler_path)
}

const HR_CSV: &str = "\
EmpNumber,Age,Gender,EmpDepartment,EmpJobRole,BusinessTravelFrequency,EmpHourlyRate,EmpRelationshipSatisfaction,PerformanceRating
E1001000,32,Male,Sales,Sales Executive,Travel_Frequently,25,3,4
E1001006,47,Male,Sales,Sales Executive,Travel_Rarely,78,4,3
E1001007,40,Male,Sales,Sales Executive,Travel_Rarely,84,4,4
";

// =============================================================================
// TIER S0: ARTIFACT LOADING
// =============================================================================

mod s0_artifact_loading {
    use super::*;

    /// S0.1: Both encodings load to the same pair.
    #[test]
    fn binary_and_json_load_identically() {
        let temp = tempdir().expect("temp dir");
        let bin_dir = temp.path().join("bin");
        let json_dir = temp.path().join("json");
        std::fs::create_dir_all(&bin_dir).expect("mkdir");
        std::fs::create_dir_all(&json_dir).expect("mkdir");

        let (m_bin, s_bin) = write_artifacts(&bin_dir, true);
        let (m_json, s_json) = write_artifacts(&json_dir, false);

        let a = load(&m_bin, &s_bin).expect("binary");
        let b = load(&m_json, &s_json).expect("json");
        assert_eq!(a.scaler, b.scaler);
        assert_eq!(a.model, b.model);
        assert_ne!(a.model_fingerprint, b.model_fingerprint);
    }

    /// S0.2: A truncated header is corrupt, not missing.
    #[test]
    fn truncated_artifact_is_corrupt() {
        let temp = tempdir().expect("temp dir");
        let (model_path, scaler_path) = write_artifacts(temp.path(), true);
        std::fs::write(&model_path, b"SRM").expect("truncate");

        let result = load(&model_path, &scaler_path);
        assert!(matches!(result, Err(SmartRaiseError::ArtifactCorrupt(_))));
    }

    /// S0.3: A scaler where a model is expected is rejected by magic.
    #[test]
    fn swapped_artifacts_rejected() {
        let temp = tempdir().expect("temp dir");
        let (model_path, scaler_path) = write_artifacts(temp.path(), true);

        let result = load(&scaler_path, &model_path);
        assert!(matches!(result, Err(SmartRaiseError::ArtifactCorrupt(_))));
    }
}

// =============================================================================
// TIER S1: INFERENCE
// =============================================================================

mod s1_inference {
    use super::*;

    /// S1.1: Scale then predict.
    #[test]
    fn reference_prediction() {
        let temp = tempdir().expect("temp dir");
        let (model_path, scaler_path) = write_artifacts(temp.path(), true);
        let pipeline = load(&model_path, &scaler_path)
            .expect("load")
            .into_pipeline();

        let out = pipeline.predict(&[12.0, 24.0, 35.0]).expect("predict");
        assert_eq!(out, Prediction::Score(3.0));
    }

    /// S1.2: Mean input scales to zero.
    #[test]
    fn mean_input_yields_intercept() {
        let model = ModelSpec::LinearRegression(LinearRegression {
            coefficients: vec![4.0, -2.0, 7.0],
            intercept: 2.5,
        });
        let pipeline = Artifacts::new(reference_scaler(), model)
            .expect("pair")
            .into_pipeline();

        let out = pipeline.predict(&[10.0, 20.0, 30.0]).expect("predict");
        assert_eq!(out, Prediction::Score(2.5));
    }

    /// S1.3: Errors leave the pipeline usable.
    #[test]
    fn pipeline_survives_bad_requests() {
        let pipeline = Artifacts::new(reference_scaler(), summing_model())
            .expect("pair")
            .into_pipeline();

        assert!(pipeline.predict(&[1.0]).is_err());
        assert!(pipeline.predict(&[f64::INFINITY, 0.0, 0.0]).is_err());
        assert!(pipeline.predict(&[12.0, 24.0, 35.0]).is_ok());
    }
}

// =============================================================================
// TIER S2: INGESTION
// =============================================================================

mod s2_ingestion {
    use super::*;

    /// S2.1: A CSV source lands in redb, then the smoke test runs.
    #[test]
    fn csv_into_redb_with_smoke_test() {
        let temp = tempdir().expect("temp dir");
        let source = temp.path().join("hr.csv");
        std::fs::write(&source, HR_CSV).expect("write csv");
        let scaler = StandardScaler::new(vec![80.0, 90.0, 60.0], vec![20.0, 10.0, 20.0])
            .expect("scaler");
        let model_path = temp.path().join("model.json");
        let scaler_path = temp.path().join("scaler.json");
        std::fs::write(&model_path, model_to_json(&summing_model()).expect("m")).expect("w");
        std::fs::write(&scaler_path, scaler_to_json(&scaler).expect("s")).expect("w");

        let mut store = RedbStore::open(temp.path().join("hr.redb")).expect("open");
        let job = Ingestor::new(SmokeTest::with_artifacts(&model_path, &scaler_path));
        let report = job.run(&mut store, &source).expect("ingest");

        assert_eq!(report.employees, 3);
        assert_eq!(report.performances, 3);
        assert!(report.smoke_test.passed(), "{:?}", report.smoke_test);

        let employees: Vec<Employee> = store.find_all().expect("employees");
        assert_eq!(employees[0].identifier, "E1001000");
        assert_eq!(employees[0].annual_salary, 52_000.0);
        let perfs: Vec<Performance> = store.find_all().expect("performances");
        assert_eq!(perfs[0].kpi_score, 80.0);
        assert_eq!(perfs[0].attendance_estimate, 90.0);
        assert_eq!(perfs[0].peer_review_score, 60.0);
        assert_eq!(perfs[1].attendance_estimate, 100.0);
    }

    /// S2.2: Running twice leaves exactly the second run's rows.
    #[test]
    fn rerun_is_full_replace() {
        let temp = tempdir().expect("temp dir");
        let first = temp.path().join("first.csv");
        let second = temp.path().join("second.csv");
        std::fs::write(&first, HR_CSV).expect("write");
        std::fs::write(
            &second,
            "EmpNumber,EmpDepartment,EmpJobRole,EmpHourlyRate,PerformanceRating,\
BusinessTravelFrequency,EmpRelationshipSatisfaction\nE2000000,R&D,Developer,50,5,Non-Travel,4\n",
        )
        .expect("write");

        let mut store = RedbStore::open(temp.path().join("hr.redb")).expect("open");
        let job = Ingestor::new(SmokeTest::Skip("test".into()));
        job.run(&mut store, &first).expect("first run");
        let report = job.run(&mut store, &second).expect("second run");

        assert_eq!(report.deleted_employees, 3);
        assert_eq!(store.count(Collection::Employees).expect("count"), 1);
        assert_eq!(store.count(Collection::Performances).expect("count"), 1);
        let employees: Vec<Employee> = store.find_all().expect("employees");
        assert_eq!(employees[0].identifier, "E2000000");
        assert!(matches!(report.smoke_test, SmokeTestOutcome::Skipped { .. }));
    }

    /// S2.3: Ingested records read back through the query functions.
    #[test]
    fn ingested_records_read_back() {
        let temp = tempdir().expect("temp dir");
        let source = temp.path().join("hr.csv");
        std::fs::write(&source, HR_CSV).expect("write csv");

        let mut store = RedbStore::open(temp.path().join("hr.redb")).expect("open");
        Ingestor::new(SmokeTest::Skip("test".into()))
            .run(&mut store, &source)
            .expect("ingest");

        assert_eq!(list_employees(&store).expect("list").len(), 3);
        let employee = find_employee(&store, "E1001006").expect("find");
        assert_eq!(employee.annual_salary, 78.0 * 2080.0);

        let history = performance_history(&store, "E1001006").expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kpi_score, 60.0);

        let summary = department_summary(&store, "Sales").expect("summary");
        assert_eq!(summary.employees, 3);
        assert_eq!(summary.records, 3);
        assert!((summary.avg_kpi_score - 220.0 / 3.0).abs() < 1e-9);
        assert!((summary.avg_attendance_estimate - 290.0 / 3.0).abs() < 1e-9);
        assert!((summary.avg_peer_review_score - 220.0 / 3.0).abs() < 1e-9);

        assert!(matches!(
            department_summary(&store, "Research"),
            Err(SmartRaiseError::RecordNotFound(_))
        ));
    }
}

// =============================================================================
// TIER S3: INGESTION FAILURE MODES
// =============================================================================

mod s3_ingestion_failures {
    use super::*;

    /// S3.1: A missing column aborts before the store is touched.
    #[test]
    fn missing_column_keeps_previous_data() {
        let temp = tempdir().expect("temp dir");
        let good = temp.path().join("good.csv");
        let bad = temp.path().join("bad.csv");
        std::fs::write(&good, HR_CSV).expect("write");
        std::fs::write(&bad, "EmpNumber,EmpDepartment\nE1,Sales\n").expect("write");

        let mut store = RedbStore::open(temp.path().join("hr.redb")).expect("open");
        let job = Ingestor::new(SmokeTest::Skip("test".into()));
        job.run(&mut store, &good).expect("seed");

        let err = job.run(&mut store, &bad).unwrap_err();
        assert!(matches!(err, SmartRaiseError::IngestionSourceUnreadable(_)));
        assert_eq!(store.count(Collection::Employees).expect("count"), 3);
    }

    /// S3.2: An out-of-range rating is an invalid record.
    #[test]
    fn out_of_range_rating_is_invalid() {
        let temp = tempdir().expect("temp dir");
        let source = temp.path().join("hr.csv");
        std::fs::write(
            &source,
            "EmpNumber,EmpDepartment,EmpJobRole,EmpHourlyRate,PerformanceRating,\
BusinessTravelFrequency,EmpRelationshipSatisfaction\nE1,Sales,Rep,20,9,Non-Travel,3\n",
        )
        .expect("write");

        let mut store = RedbStore::open(temp.path().join("hr.redb")).expect("open");
        let err = Ingestor::new(SmokeTest::Skip("test".into()))
            .run(&mut store, &source)
            .unwrap_err();
        assert!(matches!(err, SmartRaiseError::InvalidRecord(_)));
    }

    /// S3.3: A missing source file is unreadable.
    #[test]
    fn missing_source_is_unreadable() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("hr.redb")).expect("open");
        let err = Ingestor::new(SmokeTest::Skip("test".into()))
            .run(&mut store, &temp.path().join("absent.xlsx"))
            .unwrap_err();
        assert!(matches!(err, SmartRaiseError::IngestionSourceUnreadable(_)));
    }
}
