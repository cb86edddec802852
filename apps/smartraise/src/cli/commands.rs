//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::ArtifactEncoding;
use crate::api::{self, AppState};
use crate::config::Config;
use smartraise_core::primitives::MAX_ARTIFACT_SIZE;
use smartraise_core::{
    Collection, DocumentStore, Encoding, IngestReport, Ingestor, InferencePipeline, Model,
    ModelSpec, RedbStore, Result, Scaler, SmartRaiseError, SmokeTest, SmokeTestOutcome,
    StandardScaler, department_summary, find_employee, fingerprint, list_employees, load,
    model_from_bytes, model_to_bytes, model_to_json, performance_history, scaler_from_bytes,
    scaler_to_bytes, scaler_to_json,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Maximum source spreadsheet size for ingestion (100 MB).
const MAX_INGEST_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SmartRaiseError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SmartRaiseError::IngestionSourceUnreadable(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf> {
    let canonical = path.canonicalize().map_err(|e| {
        SmartRaiseError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SmartRaiseError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SmartRaiseError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(SmartRaiseError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| SmartRaiseError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

/// Load both configured artifacts into a pipeline.
fn load_pipeline(config: &Config) -> Result<InferencePipeline> {
    let (model, scaler) = config.artifacts.paths()?;
    let artifacts = load(model, scaler)?;
    Ok(artifacts.into_pipeline())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Load artifacts, then start the HTTP server.
///
/// Any artifact error ends the process before the listener binds.
pub async fn cmd_serve(config: &Config) -> Result<()> {
    let pipeline = load_pipeline(config)?;
    let info = pipeline.info().clone();
    let server = &config.server;

    println!("SmartRaise Prediction Service Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", server.host);
    println!("  Port:     {}", server.port);
    println!("  Model:    {} ({} features)", info.kind, info.n_features);
    println!("  Output:   {} ({})", info.output, server.prediction_shape);
    println!();
    println!("Endpoints:");
    println!("  GET  /        - Welcome message");
    println!("  GET  /health  - Health check");
    println!("  GET  /model   - Loaded artifacts");
    println!("  POST /predict - Predict from features");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(pipeline, server.prediction_shape);
    api::run_server(state, server).await
}

// =============================================================================
// PREDICT COMMAND
// =============================================================================

/// Run one prediction and print it.
pub fn cmd_predict(config: &Config, features: &[f64], json_mode: bool) -> Result<()> {
    let pipeline = load_pipeline(config)?;
    let prediction = pipeline.predict(features)?;

    if json_mode {
        print_json(&serde_json::json!({
            "features": features,
            "prediction": prediction,
            "output": pipeline.output_kind(),
        }));
        return Ok(());
    }

    println!("Prediction: {}", prediction);
    Ok(())
}

// =============================================================================
// INGEST COMMAND
// =============================================================================

fn smoke_test_for(config: &Config) -> SmokeTest {
    if !config.ingest.smoke_test {
        return SmokeTest::Skip("disabled".to_string());
    }
    match (&config.artifacts.model, &config.artifacts.scaler) {
        (Some(model), Some(scaler)) => SmokeTest::Run {
            model: model.clone(),
            scaler: scaler.clone(),
            features: config.artifacts.features.clone(),
        },
        _ => SmokeTest::Skip("no artifacts configured".to_string()),
    }
}

/// Replace both collections from `file`, then run the smoke test.
pub fn cmd_ingest(config: &Config, file: &Path, json_mode: bool) -> Result<()> {
    let source = validate_file_path(file)
        .map_err(|e| SmartRaiseError::IngestionSourceUnreadable(e.to_string()))?;
    validate_file_size(&source, MAX_INGEST_FILE_SIZE)?;

    let mut store = RedbStore::open(&config.ingest.database)?;
    let report = Ingestor::new(smoke_test_for(config)).run(&mut store, &source)?;

    if json_mode {
        print_json(&serde_json::to_value(&report).unwrap_or_default());
        return Ok(());
    }

    print_ingest_report(&report, &config.ingest.database);
    Ok(())
}

fn print_ingest_report(report: &IngestReport, database: &Path) {
    println!("Ingestion complete");
    println!("==================");
    println!("Database:     {}", database.display());
    println!("Observed at:  {}", report.observed_at.to_rfc3339());
    println!(
        "Employees:    {} written ({} replaced)",
        report.employees, report.deleted_employees
    );
    println!(
        "Performances: {} written ({} replaced)",
        report.performances, report.deleted_performances
    );
    match &report.smoke_test {
        SmokeTestOutcome::Passed {
            features,
            prediction,
        } => println!("Smoke test:   passed, {:?} -> {}", features, prediction),
        SmokeTestOutcome::Failed { reason } => println!("Smoke test:   FAILED ({})", reason),
        SmokeTestOutcome::Skipped { reason } => println!("Smoke test:   skipped ({})", reason),
    }
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Open the configured database, refusing to create a new one.
fn open_existing_store(config: &Config) -> Result<RedbStore> {
    let database = &config.ingest.database;
    if !database.exists() {
        return Err(SmartRaiseError::IoError(format!(
            "Database '{}' does not exist; run `smartraise ingest` first",
            database.display()
        )));
    }
    RedbStore::open(database)
}

/// Show document counts for both collections.
pub fn cmd_status(config: &Config, json_mode: bool) -> Result<()> {
    let database = &config.ingest.database;
    let store = open_existing_store(config)?;
    let employees = store.count(Collection::Employees)?;
    let performances = store.count(Collection::Performances)?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": database.to_string_lossy(),
            "employees": employees,
            "performances": performances,
        }));
        return Ok(());
    }

    println!("SmartRaise Store Status");
    println!("=======================");
    println!("Database:     {}", database.display());
    println!();
    println!("Employees:    {}", employees);
    println!("Performances: {}", performances);
    Ok(())
}

// =============================================================================
// READ COMMANDS
// =============================================================================

/// List every employee, or show the one with `id`.
pub fn cmd_employees(config: &Config, id: Option<&str>, json_mode: bool) -> Result<()> {
    let store = open_existing_store(config)?;
    let employees = match id {
        Some(id) => vec![find_employee(&store, id)?],
        None => list_employees(&store)?,
    };

    if json_mode {
        let value = match id {
            Some(_) => serde_json::to_value(employees.first()),
            None => serde_json::to_value(&employees),
        };
        print_json(&value.unwrap_or_default());
        return Ok(());
    }

    println!(
        "{:<12} {:<24} {:<28} {:>14}",
        "ID", "Department", "Role", "Annual salary"
    );
    for e in &employees {
        println!(
            "{:<12} {:<24} {:<28} {:>14.2}",
            e.identifier, e.department, e.role, e.annual_salary
        );
    }
    println!();
    println!("{} employee(s)", employees.len());
    Ok(())
}

/// Show the performance records of one employee, oldest first.
pub fn cmd_performance(config: &Config, employee: &str, json_mode: bool) -> Result<()> {
    let store = open_existing_store(config)?;
    let history = performance_history(&store, employee)?;

    if json_mode {
        print_json(&serde_json::to_value(&history).unwrap_or_default());
        return Ok(());
    }

    println!("Performance history for {}", employee);
    println!();
    if history.is_empty() {
        println!("No records.");
        return Ok(());
    }
    println!(
        "{:<26} {:>8} {:>11} {:>12}",
        "Observed at", "KPI", "Attendance", "Peer review"
    );
    for p in &history {
        println!(
            "{:<26} {:>8.1} {:>11.1} {:>12.1}",
            p.observed_at.to_rfc3339(),
            p.kpi_score,
            p.attendance_estimate,
            p.peer_review_score
        );
    }
    Ok(())
}

/// Average kpi, attendance and peer review over a department.
pub fn cmd_department(config: &Config, name: &str, json_mode: bool) -> Result<()> {
    let store = open_existing_store(config)?;
    let summary = department_summary(&store, name)?;

    if json_mode {
        print_json(&serde_json::to_value(&summary).unwrap_or_default());
        return Ok(());
    }

    println!("Department: {}", summary.department);
    println!("==========");
    println!("Employees:        {}", summary.employees);
    println!("Records:          {}", summary.records);
    println!("Avg KPI:          {:.2}", summary.avg_kpi_score);
    println!("Avg attendance:   {:.2}", summary.avg_attendance_estimate);
    println!("Avg peer review:  {:.2}", summary.avg_peer_review_score);
    Ok(())
}

// =============================================================================
// INSPECT / CONVERT COMMANDS
// =============================================================================

/// A decoded artifact of either type.
enum AnyArtifact {
    Scaler(StandardScaler),
    Model(ModelSpec),
}

fn read_any_artifact(path: &Path) -> Result<(AnyArtifact, Vec<u8>)> {
    let canonical = validate_file_path(path)?;
    validate_file_size(&canonical, MAX_ARTIFACT_SIZE)
        .map_err(|e| SmartRaiseError::ArtifactCorrupt(e.to_string()))?;
    let bytes = std::fs::read(&canonical)
        .map_err(|e| SmartRaiseError::IoError(format!("Cannot read file: {}", e)))?;

    let artifact = match scaler_from_bytes(&bytes) {
        Ok(scaler) => AnyArtifact::Scaler(scaler),
        Err(scaler_err) => match model_from_bytes(&bytes) {
            Ok(model) => AnyArtifact::Model(model),
            Err(model_err) => {
                return Err(SmartRaiseError::ArtifactCorrupt(format!(
                    "'{}' is neither a scaler ({}) nor a model ({})",
                    path.display(),
                    scaler_err,
                    model_err
                )));
            }
        },
    };
    Ok((artifact, bytes))
}

/// Describe an artifact file.
pub fn cmd_inspect(path: &Path, json_mode: bool) -> Result<()> {
    let (artifact, bytes) = read_any_artifact(path)?;
    let encoding = match Encoding::detect(&bytes) {
        Encoding::Binary => "binary",
        Encoding::Json => "json",
    };
    let digest = fingerprint(&bytes);

    let details = match &artifact {
        AnyArtifact::Scaler(scaler) => serde_json::json!({
            "artifact": "scaler",
            "n_features": scaler.n_features(),
            "feature_names": scaler.feature_names(),
        }),
        AnyArtifact::Model(model) => serde_json::json!({
            "artifact": "model",
            "kind": model.kind_name(),
            "output": model.output_kind(),
            "n_features": model.n_features(),
        }),
    };

    if json_mode {
        let mut output = details;
        if let Some(map) = output.as_object_mut() {
            map.insert("encoding".into(), encoding.into());
            map.insert("size_bytes".into(), bytes.len().into());
            map.insert("fingerprint".into(), digest.into());
        }
        print_json(&output);
        return Ok(());
    }

    println!("Artifact:    {}", path.display());
    println!("Encoding:    {}", encoding);
    println!("Size:        {} bytes", bytes.len());
    println!("Fingerprint: {}", digest);
    match &artifact {
        AnyArtifact::Scaler(scaler) => {
            println!("Type:        scaler");
            println!("Features:    {}", scaler.n_features());
            if let Some(names) = scaler.feature_names() {
                println!("Names:       {}", names.join(", "));
            }
        }
        AnyArtifact::Model(model) => {
            println!("Type:        model ({})", model.kind_name());
            println!("Output:      {}", model.output_kind());
            println!("Features:    {}", model.n_features());
        }
    }
    Ok(())
}

/// Re-encode an artifact, validating it on the way.
pub fn cmd_convert(
    input: &Path,
    output: &Path,
    to: ArtifactEncoding,
    json_mode: bool,
) -> Result<()> {
    let (artifact, _) = read_any_artifact(input)?;
    let output_path = validate_output_path(output)?;

    let encoded = match (&artifact, to) {
        (AnyArtifact::Scaler(s), ArtifactEncoding::Binary) => scaler_to_bytes(s)?,
        (AnyArtifact::Scaler(s), ArtifactEncoding::Json) => scaler_to_json(s)?,
        (AnyArtifact::Model(m), ArtifactEncoding::Binary) => model_to_bytes(m)?,
        (AnyArtifact::Model(m), ArtifactEncoding::Json) => model_to_json(m)?,
    };
    std::fs::write(&output_path, &encoded)
        .map_err(|e| SmartRaiseError::IoError(format!("Cannot write output: {}", e)))?;

    let digest = fingerprint(&encoded);
    if json_mode {
        print_json(&serde_json::json!({
            "input": input.to_string_lossy(),
            "output": output_path.to_string_lossy(),
            "size_bytes": encoded.len(),
            "fingerprint": digest,
        }));
        return Ok(());
    }

    println!("Converted {} -> {}", input.display(), output_path.display());
    println!("Fingerprint: {}", digest);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
