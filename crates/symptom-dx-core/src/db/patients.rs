//! Patient history database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{HistoryEntry, PatientHistory};

/// Raw patient row before JSON columns are decoded.
struct PatientRow {
    patient_id: String,
    previous_conditions: String,
    current_medications: String,
    allergies: String,
}

/// Raw history entry row before JSON columns are decoded.
struct EntryRow {
    date: String,
    entry_type: String,
    symptoms: String,
    diagnosis: Option<String>,
    prescribed_medications: String,
    notes: Option<String>,
}

impl Database {
    /// Insert or replace a patient's history, including all visit entries.
    pub fn upsert_patient_history(&mut self, history: &PatientHistory) -> DbResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO patients (
                patient_id, previous_conditions, current_medications, allergies
            ) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(patient_id) DO UPDATE SET
                previous_conditions = excluded.previous_conditions,
                current_medications = excluded.current_medications,
                allergies = excluded.allergies,
                updated_at = datetime('now')
            "#,
            params![
                history.patient_id,
                serde_json::to_string(&history.previous_conditions)?,
                serde_json::to_string(&history.current_medications)?,
                serde_json::to_string(&history.allergies)?,
            ],
        )?;

        tx.execute(
            "DELETE FROM history_entries WHERE patient_id = ?",
            [&history.patient_id],
        )?;

        for (position, entry) in history.medical_history.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO history_entries (
                    patient_id, position, date, entry_type, symptoms,
                    diagnosis, prescribed_medications, notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    history.patient_id,
                    position as i64,
                    entry.date,
                    entry.entry_type,
                    serde_json::to_string(&entry.symptoms)?,
                    entry.diagnosis,
                    serde_json::to_string(&entry.prescribed_medications)?,
                    entry.notes,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a patient's history. `None` if the patient is unknown.
    pub fn get_patient_history(&self, patient_id: &str) -> DbResult<Option<PatientHistory>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT patient_id, previous_conditions, current_medications, allergies
                FROM patients
                WHERE patient_id = ?
                "#,
                [patient_id],
                |row| {
                    Ok(PatientRow {
                        patient_id: row.get(0)?,
                        previous_conditions: row.get(1)?,
                        current_medications: row.get(2)?,
                        allergies: row.get(3)?,
                    })
                },
            )
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(PatientHistory {
            medical_history: self.get_history_entries(&row.patient_id)?,
            previous_conditions: serde_json::from_str(&row.previous_conditions)?,
            current_medications: serde_json::from_str(&row.current_medications)?,
            allergies: serde_json::from_str(&row.allergies)?,
            patient_id: row.patient_id,
        }))
    }

    /// Get a patient's history, failing if the patient is unknown.
    pub fn require_patient_history(&self, patient_id: &str) -> DbResult<PatientHistory> {
        self.get_patient_history(patient_id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", patient_id)))
    }

    fn get_history_entries(&self, patient_id: &str) -> DbResult<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT date, entry_type, symptoms, diagnosis, prescribed_medications, notes
            FROM history_entries
            WHERE patient_id = ?
            ORDER BY position
            "#,
        )?;

        let rows = stmt.query_map([patient_id], |row| {
            Ok(EntryRow {
                date: row.get(0)?,
                entry_type: row.get(1)?,
                symptoms: row.get(2)?,
                diagnosis: row.get(3)?,
                prescribed_medications: row.get(4)?,
                notes: row.get(5)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let row = row?;
            entries.push(HistoryEntry {
                date: row.date,
                entry_type: row.entry_type,
                symptoms: serde_json::from_str(&row.symptoms)?,
                diagnosis: row.diagnosis,
                prescribed_medications: serde_json::from_str(&row.prescribed_medications)?,
                notes: row.notes,
            });
        }
        Ok(entries)
    }

    /// List all patient IDs with a stored history.
    pub fn list_patient_ids(&self) -> DbResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT patient_id FROM patients ORDER BY patient_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
