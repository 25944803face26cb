//! Diagnosis record database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{AnalysisSource, DiagnosisRecord};

/// Raw diagnosis row before JSON columns are decoded.
struct RecordRow {
    record_id: String,
    patient_id: String,
    recorded_at: String,
    primary_symptoms: String,
    secondary_symptoms: String,
    report: String,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record_id: row.get(0)?,
            patient_id: row.get(1)?,
            recorded_at: row.get(2)?,
            primary_symptoms: row.get(3)?,
            secondary_symptoms: row.get(4)?,
            report: row.get(5)?,
        })
    }

    fn into_record(self) -> DbResult<DiagnosisRecord> {
        Ok(DiagnosisRecord {
            record_id: self.record_id,
            patient_id: self.patient_id,
            recorded_at: self.recorded_at,
            primary_symptoms: serde_json::from_str(&self.primary_symptoms)?,
            secondary_symptoms: serde_json::from_str(&self.secondary_symptoms)?,
            report: serde_json::from_str(&self.report)?,
        })
    }
}

impl Database {
    /// Append a diagnosis record.
    pub fn insert_diagnosis_record(&self, record: &DiagnosisRecord) -> DbResult<()> {
        let top_diagnosis = record.report.top_diagnosis().map(|(name, _)| name);

        self.conn.execute(
            r#"
            INSERT INTO diagnoses (
                record_id, patient_id, recorded_at, primary_symptoms,
                secondary_symptoms, top_diagnosis, source, report
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.record_id,
                record.patient_id,
                record.recorded_at,
                serde_json::to_string(&record.primary_symptoms)?,
                serde_json::to_string(&record.secondary_symptoms)?,
                top_diagnosis,
                source_to_string(record.report.source),
                serde_json::to_string(&record.report)?,
            ],
        )?;
        Ok(())
    }

    /// Get a diagnosis record by ID.
    pub fn get_diagnosis_record(&self, record_id: &str) -> DbResult<Option<DiagnosisRecord>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT record_id, patient_id, recorded_at, primary_symptoms,
                       secondary_symptoms, report
                FROM diagnoses
                WHERE record_id = ?
                "#,
                [record_id],
                RecordRow::from_row,
            )
            .optional()?;

        row.map(RecordRow::into_record).transpose()
    }

    /// All diagnosis records for a patient, oldest first.
    pub fn list_diagnosis_records(&self, patient_id: &str) -> DbResult<Vec<DiagnosisRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT record_id, patient_id, recorded_at, primary_symptoms,
                   secondary_symptoms, report
            FROM diagnoses
            WHERE patient_id = ?
            ORDER BY recorded_at, rowid
            "#,
        )?;

        let rows = stmt.query_map([patient_id], RecordRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    /// Count diagnosis records, optionally for one patient.
    pub fn count_diagnosis_records(&self, patient_id: Option<&str>) -> DbResult<u64> {
        let count: i64 = match patient_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM diagnoses WHERE patient_id = ?",
                [id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM diagnoses", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }
}

fn source_to_string(source: AnalysisSource) -> &'static str {
    match source {
        AnalysisSource::Insufficient => "insufficient",
        AnalysisSource::External => "external",
        AnalysisSource::Local => "local",
    }
}
