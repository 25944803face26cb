//! Case dataset readers.
//!
//! A dataset is a table of `(disease, symptom)` rows. Two encodings are
//! accepted: CSV with a header row, and a JSON array of objects.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use serde_json::Value;
use tracing::debug;

use super::{DatasetError, DatasetResult};
use crate::models::CaseRecord;

const DISEASE_COLUMNS: &[&str] = &["disease", "diseases"];
const SYMPTOM_COLUMNS: &[&str] = &["symptom", "symptoms"];

/// Read case rows from CSV. The header must name a disease and a symptom column.
///
/// Quoted fields may contain commas, escaped quotes and line breaks.
pub fn read_csv<R: Read>(reader: R) -> DatasetResult<Vec<CaseRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if header.is_empty() {
        return Err(DatasetError::Schema("empty dataset: no header row".into()));
    }

    let disease_idx = find_column(&header, DISEASE_COLUMNS)?;
    let symptom_idx = find_column(&header, SYMPTOM_COLUMNS)?;
    let needed = disease_idx.max(symptom_idx) + 1;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.len() == 1 && row[0].trim().is_empty() {
            continue;
        }

        if row.len() < needed {
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            return Err(DatasetError::Schema(format!(
                "line {}: expected at least {} columns, found {}",
                line,
                needed,
                row.len()
            )));
        }

        records.push(CaseRecord::new(&row[disease_idx], &row[symptom_idx]));
    }

    debug!(rows = records.len(), "Read CSV dataset");
    Ok(records)
}

/// Read case rows from a JSON array of `{"disease": .., "symptom": ..}` objects.
pub fn read_json<R: Read>(reader: R) -> DatasetResult<Vec<CaseRecord>> {
    let value: Value = serde_json::from_reader(reader)?;

    let rows = value
        .as_array()
        .ok_or_else(|| DatasetError::Schema("expected a JSON array of case rows".into()))?;

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let disease = string_field(row, "disease", index)?;
        let symptom = string_field(row, "symptom", index)?;
        records.push(CaseRecord::new(disease, symptom));
    }

    debug!(rows = records.len(), "Read JSON dataset");
    Ok(records)
}

/// Read a dataset file, choosing the reader by extension (`.json`, else CSV).
pub fn load_dataset(path: impl AsRef<Path>) -> DatasetResult<Vec<CaseRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        read_json(BufReader::new(file))
    } else {
        read_csv(BufReader::new(file))
    }
}

fn find_column(header: &[String], names: &[&str]) -> DatasetResult<usize> {
    header
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        .ok_or_else(|| {
            DatasetError::Schema(format!(
                "missing required column '{}' (found: {})",
                names[0],
                header.join(", ")
            ))
        })
}

fn string_field(row: &Value, field: &str, index: usize) -> DatasetResult<String> {
    row.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            DatasetError::Schema(format!("row {}: missing string field '{}'", index, field))
        })
}
