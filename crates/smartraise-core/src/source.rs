//! # Ingestion Source
//!
//! Reads the HR spreadsheet into typed rows.
//!
//! Supported inputs: `.csv` via the `csv` crate, and `.xlsx`, `.xlsm`,
//! `.xls`, `.ods` via `calamine` (first worksheet only). Columns are located
//! by header name; extra columns are ignored.

use crate::primitives::{
    COL_DEPARTMENT, COL_EMP_NUMBER, COL_HOURLY_RATE, COL_JOB_ROLE, COL_PERFORMANCE_RATING,
    COL_RELATIONSHIP_SATISFACTION, COL_TRAVEL_FREQUENCY, MAX_SOURCE_ROWS, REQUIRED_COLUMNS,
};
use crate::records::HrRow;
use crate::{Result, SmartRaiseError};
use calamine::{Data, Reader, open_workbook_auto};
use std::io::Read;
use std::path::Path;

// =============================================================================
// RAW TABLE
// =============================================================================

/// One spreadsheet cell, reduced to what ingestion can use.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            // Spreadsheets store integral ids as floats.
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Self::Number(n) => Some(n.to_string()),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Number(n) => n.is_finite().then_some(*n),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Self::Number(*i as f64),
            Data::Float(f) => Self::Number(*f),
            Data::String(s) => Self::Text(s.clone()),
            Data::Bool(b) => Self::Text(b.to_string()),
            Data::Empty => Self::Empty,
            other => Self::Text(other.to_string()),
        }
    }
}

/// A header row plus data rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

fn unreadable(msg: impl Into<String>) -> SmartRaiseError {
    SmartRaiseError::IngestionSourceUnreadable(msg.into())
}

// =============================================================================
// READERS
// =============================================================================

/// Read CSV text with a header row.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| unreadable(format!("header row: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| unreadable(format!("row {}: {}", i + 2, e)))?;
        if rows.len() >= MAX_SOURCE_ROWS {
            return Err(unreadable(format!(
                "source has more than {} rows",
                MAX_SOURCE_ROWS
            )));
        }
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

/// Read the first worksheet of an Excel or OpenDocument workbook.
pub fn read_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| unreadable(format!("{}: {}", path.display(), e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable(format!("{}: workbook has no worksheets", path.display())))?
        .map_err(|e| unreadable(format!("{}: {}", path.display(), e)))?;

    let mut sheet_rows = range.rows();
    let headers = sheet_rows
        .next()
        .ok_or_else(|| unreadable(format!("{}: first worksheet is empty", path.display())))?
        .iter()
        .map(|cell| CellValue::from(cell).as_text().unwrap_or_default())
        .collect();

    let mut rows = Vec::new();
    for row in sheet_rows {
        if rows.len() >= MAX_SOURCE_ROWS {
            return Err(unreadable(format!(
                "source has more than {} rows",
                MAX_SOURCE_ROWS
            )));
        }
        rows.push(row.iter().map(CellValue::from).collect());
    }

    Ok(RawTable { headers, rows })
}

/// Read a source file, choosing the reader by extension.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .map_err(|e| unreadable(format!("{}: {}", path.display(), e)))?;
            read_csv(std::io::BufReader::new(file))
        }
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path),
        other => Err(unreadable(format!(
            "{}: unsupported source extension '{}'",
            path.display(),
            other
        ))),
    }
}

// =============================================================================
// ROW MAPPING
// =============================================================================

struct ColumnIndex {
    emp_number: usize,
    department: usize,
    job_role: usize,
    hourly_rate: usize,
    performance_rating: usize,
    travel_frequency: usize,
    relationship_satisfaction: usize,
}

impl ColumnIndex {
    fn locate(headers: &[String]) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| unreadable(format!("missing required column '{}'", name)))
        };

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| !headers.iter().any(|h| h.trim() == *name))
            .collect();
        if !missing.is_empty() {
            return Err(unreadable(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            emp_number: find(COL_EMP_NUMBER)?,
            department: find(COL_DEPARTMENT)?,
            job_role: find(COL_JOB_ROLE)?,
            hourly_rate: find(COL_HOURLY_RATE)?,
            performance_rating: find(COL_PERFORMANCE_RATING)?,
            travel_frequency: find(COL_TRAVEL_FREQUENCY)?,
            relationship_satisfaction: find(COL_RELATIONSHIP_SATISFACTION)?,
        })
    }
}

/// Spreadsheet row number, counting the header as row 1.
fn display_row(index: usize) -> usize {
    index + 2
}

fn text_cell(row: &[CellValue], col: usize, line: usize, name: &str) -> Result<String> {
    row.get(col)
        .and_then(CellValue::as_text)
        .ok_or_else(|| unreadable(format!("row {}, column '{}': empty cell", line, name)))
}

fn number_cell(row: &[CellValue], col: usize, line: usize, name: &str) -> Result<f64> {
    let cell = row.get(col).unwrap_or(&CellValue::Empty);
    cell.as_number().ok_or_else(|| {
        unreadable(format!(
            "row {}, column '{}': expected a number, got {:?}",
            line, name, cell
        ))
    })
}

/// Map a raw table onto typed rows.
///
/// Blank rows are skipped. The first missing column or unparsable cell
/// aborts the whole read.
pub fn rows_from_table(table: &RawTable) -> Result<Vec<HrRow>> {
    let cols = ColumnIndex::locate(&table.headers)?;

    let mut rows = Vec::with_capacity(table.rows.len());
    for (i, raw) in table.rows.iter().enumerate() {
        if raw.iter().all(CellValue::is_empty) {
            continue;
        }
        let line = display_row(i);
        rows.push(HrRow {
            emp_number: text_cell(raw, cols.emp_number, line, COL_EMP_NUMBER)?,
            department: text_cell(raw, cols.department, line, COL_DEPARTMENT)?,
            job_role: text_cell(raw, cols.job_role, line, COL_JOB_ROLE)?,
            hourly_rate: number_cell(raw, cols.hourly_rate, line, COL_HOURLY_RATE)?,
            performance_rating: number_cell(
                raw,
                cols.performance_rating,
                line,
                COL_PERFORMANCE_RATING,
            )?,
            travel_frequency: text_cell(raw, cols.travel_frequency, line, COL_TRAVEL_FREQUENCY)?,
            relationship_satisfaction: number_cell(
                raw,
                cols.relationship_satisfaction,
                line,
                COL_RELATIONSHIP_SATISFACTION,
            )?,
        });
    }
    Ok(rows)
}

/// Read and map a source file in one step.
pub fn read_rows(path: &Path) -> Result<Vec<HrRow>> {
    let table = read_table(path)?;
    let rows = rows_from_table(&table)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "Source read");
    Ok(rows)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HEADER: &str = "EmpNumber,Age,EmpDepartment,EmpJobRole,EmpHourlyRate,\
PerformanceRating,BusinessTravelFrequency,EmpRelationshipSatisfaction";

    #[test]
    fn reads_csv_rows_ignoring_extra_columns() {
        let text = format!(
            "{}\nE1001000,32,Sales,Sales Executive,25,4,Travel_Frequently,3\n\
E1001006,47,Sales,Manager,78,3,Travel_Rarely,4\n",
            HEADER
        );
        let table = read_csv(text.as_bytes()).expect("csv");
        let rows = rows_from_table(&table).expect("rows");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].emp_number, "E1001000");
        assert_eq!(rows[0].hourly_rate, 25.0);
        assert_eq!(rows[0].travel_frequency, "Travel_Frequently");
        assert_eq!(rows[1].job_role, "Manager");
        assert_eq!(rows[1].relationship_satisfaction, 4.0);
    }

    #[test]
    fn missing_column_is_unreadable() {
        let text = "EmpNumber,EmpDepartment\nE1,Sales\n";
        let table = read_csv(text.as_bytes()).expect("csv");
        let err = rows_from_table(&table).unwrap_err();

        assert!(matches!(err, SmartRaiseError::IngestionSourceUnreadable(_)));
        assert!(err.to_string().contains("EmpHourlyRate"));
    }

    #[test]
    fn bad_cell_names_row_and_column() {
        let text = format!(
            "{}\nE1,30,Sales,Rep,25,4,Non-Travel,3\nE2,31,Sales,Rep,lots,4,Non-Travel,3\n",
            HEADER
        );
        let table = read_csv(text.as_bytes()).expect("csv");
        let err = rows_from_table(&table).unwrap_err().to_string();

        assert!(err.contains("row 3"), "{}", err);
        assert!(err.contains("EmpHourlyRate"), "{}", err);
    }

    #[test]
    fn blank_rows_skipped() {
        let text = format!("{}\nE1,30,Sales,Rep,25,4,Non-Travel,3\n,,,,,,,\n", HEADER);
        let table = read_csv(text.as_bytes()).expect("csv");
        assert_eq!(rows_from_table(&table).expect("rows").len(), 1);
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(1001.0).as_text().as_deref(), Some("1001"));
        assert_eq!(CellValue::Number(2.5).as_text().as_deref(), Some("2.5"));
        assert_eq!(CellValue::Text(" 4 ".into()).as_number(), Some(4.0));
        assert_eq!(CellValue::Text("NaN".into()).as_number(), None);
    }

    #[test]
    fn unsupported_extension_rejected() {
        let err = read_table(Path::new("people.json")).unwrap_err();
        assert!(matches!(err, SmartRaiseError::IngestionSourceUnreadable(_)));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = read_rows(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, SmartRaiseError::IngestionSourceUnreadable(_)));
    }
}
