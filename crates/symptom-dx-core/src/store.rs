//! Storage seams used by the diagnosis service.
//!
//! The core only reads patient history and appends diagnosis records.
//! [`SqliteStore`] implements both on one SQLite database; the lock is
//! held for a single query and never across an `.await`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::db::{Database, DbError};
use crate::models::{DiagnosisRecord, PatientHistory};

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Store lock poisoned: {0}")]
    Poisoned(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(e: PoisonError<T>) -> Self {
        StoreError::Poisoned(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only access to patient history.
pub trait PatientHistoryStore: Send + Sync {
    /// `Ok(None)` when the patient has no stored history.
    fn get_history(&self, patient_id: &str) -> StoreResult<Option<PatientHistory>>;
}

/// Append-only sink for produced diagnoses.
pub trait DiagnosisRecordStore: Send + Sync {
    fn save(&self, record: &DiagnosisRecord) -> StoreResult<()>;
}

/// SQLite-backed implementation of both store traits.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening SQLite store");
        Ok(Self {
            db: Mutex::new(Database::open(path)?),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            db: Mutex::new(Database::open_in_memory()?),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Database>> {
        Ok(self.db.lock()?)
    }

    /// Insert or replace a patient's history.
    pub fn upsert_patient_history(&self, history: &PatientHistory) -> StoreResult<()> {
        self.lock()?.upsert_patient_history(history)?;
        Ok(())
    }

    /// Get a patient's history, failing with `NotFound` if unknown.
    pub fn require_patient_history(&self, patient_id: &str) -> StoreResult<PatientHistory> {
        Ok(self.lock()?.require_patient_history(patient_id)?)
    }

    /// All diagnosis records for a patient, oldest first.
    pub fn list_diagnosis_records(&self, patient_id: &str) -> StoreResult<Vec<DiagnosisRecord>> {
        Ok(self.lock()?.list_diagnosis_records(patient_id)?)
    }

    /// Number of stored diagnosis records, for one patient or all.
    pub fn count_diagnosis_records(&self, patient_id: Option<&str>) -> StoreResult<u64> {
        Ok(self.lock()?.count_diagnosis_records(patient_id)?)
    }

    /// IDs of every patient with a stored history.
    pub fn list_patient_ids(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock()?.list_patient_ids()?)
    }
}

impl PatientHistoryStore for SqliteStore {
    fn get_history(&self, patient_id: &str) -> StoreResult<Option<PatientHistory>> {
        Ok(self.lock()?.get_patient_history(patient_id)?)
    }
}

impl DiagnosisRecordStore for SqliteStore {
    fn save(&self, record: &DiagnosisRecord) -> StoreResult<()> {
        self.lock()?.insert_diagnosis_record(record)?;
        Ok(())
    }
}
