//! Symptom-DX Core Library
//!
//! Symptom intake and differential-diagnosis ranking.
//!
//! # Architecture
//!
//! ```text
//!   Offline                                Online (per request)
//!
//!   Case dataset (CSV / JSON)              Patient ID + primary/secondary symptoms
//!           │                                          │
//!   SymptomFrequencyBuilder                       Normalization
//!           │                                          │
//!     KnowledgeBase ──── snapshot ────▶  KnowledgeBase (immutable, shared)
//!                                                      │
//!                              ┌───── Severity + Relationships
//!                              │                       │
//!                              │         ExternalAnalysisAdapter (bounded by timeout)
//!                              │               │ ok           │ failure / timeout / empty
//!                              │               ▼              ▼
//!                              │         external report   local Jaccard scoring
//!                              │               └──────┬───────┘
//!                              └──────────────▶ DiagnosticReport ──▶ DiagnosisRecordStore
//! ```
//!
//! # Modules
//!
//! - [`knowledge`]: disease profiles, builder, snapshot persistence, audit
//! - [`analysis`]: normalizer, severity estimation, relationship detection
//! - [`ranker`]: ranking policy, adapter trait, local scoring, summaries
//! - [`db`]: SQLite database layer
//! - [`store`]: patient history and diagnosis record stores
//! - [`models`]: domain types

pub mod analysis;
pub mod db;
pub mod knowledge;
pub mod models;
pub mod ranker;
pub mod store;

// Re-export commonly used types
pub use db::Database;
pub use knowledge::{KnowledgeBase, KnowledgeLoadError, SymptomFrequencyBuilder, Vocabulary};
pub use models::{
    CaseRecord, DiagnosisRecord, DiagnosticReport, DiseaseProfile, PatientHistory,
    StructuredAnalysis, SymptomReport,
};
pub use ranker::{AdapterFailure, DiagnosisRanker, ExternalAnalysisAdapter, RankerConfig};
pub use store::{DiagnosisRecordStore, PatientHistoryStore, SqliteStore, StoreError};

use std::sync::Arc;

use thiserror::Error;
use tokio::task;
use tracing::{info, instrument, warn};

/// Errors surfaced by [`DiagnosisService::diagnose`].
#[derive(Error, Debug)]
pub enum DxError {
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type DxResult<T> = Result<T, DxError>;

/// What to do when a patient has no stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPolicy {
    /// Rank against an empty history.
    #[default]
    Optional,
    /// Refuse to rank.
    Required,
}

/// Request-level entry point: history lookup, ranking, record persistence.
pub struct DiagnosisService {
    ranker: DiagnosisRanker,
    history: Arc<dyn PatientHistoryStore>,
    records: Option<Arc<dyn DiagnosisRecordStore>>,
    adapter: Option<Arc<dyn ExternalAnalysisAdapter>>,
    history_policy: HistoryPolicy,
}

impl DiagnosisService {
    pub fn new(ranker: DiagnosisRanker, history: Arc<dyn PatientHistoryStore>) -> Self {
        Self {
            ranker,
            history,
            records: None,
            adapter: None,
            history_policy: HistoryPolicy::default(),
        }
    }

    /// Persist every produced report to `records`.
    pub fn with_record_store(mut self, records: Arc<dyn DiagnosisRecordStore>) -> Self {
        self.records = Some(records);
        self
    }

    /// Consult an external reasoning service before local scoring.
    pub fn with_adapter(mut self, adapter: Arc<dyn ExternalAnalysisAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn with_history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.history_policy = policy;
        self
    }

    pub fn ranker(&self) -> &DiagnosisRanker {
        &self.ranker
    }

    /// Symptom vocabulary for display.
    pub fn available_symptoms(&self) -> &Vocabulary {
        self.ranker.knowledge().vocabulary()
    }

    /// Rank a differential for a patient.
    ///
    /// A failed record save is logged and does not affect the returned
    /// report. History read errors are returned. Store calls run on the
    /// blocking pool.
    #[instrument(skip(self, primary, secondary))]
    pub async fn diagnose<P, S>(
        &self,
        patient_id: &str,
        primary: P,
        secondary: S,
    ) -> DxResult<DiagnosticReport>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let symptoms = SymptomReport::new(primary, secondary);

        let lookup = {
            let store = Arc::clone(&self.history);
            let patient_id = patient_id.to_string();
            task::spawn_blocking(move || store.get_history(&patient_id))
        };
        let stored = lookup
            .await
            .map_err(|e| StoreError::Backend(format!("history lookup task failed: {}", e)))??;

        let history = match stored {
            Some(history) => history,
            None => match self.history_policy {
                HistoryPolicy::Optional => {
                    info!("No stored history, ranking with empty history");
                    PatientHistory::empty(patient_id)
                }
                HistoryPolicy::Required => {
                    return Err(DxError::PatientNotFound(patient_id.to_string()))
                }
            },
        };

        let report = self
            .ranker
            .rank(&symptoms, &history, self.adapter.as_deref())
            .await;

        if let Some(records) = &self.records {
            let record = DiagnosisRecord::new(patient_id, &symptoms, report.clone());
            let record_id = record.record_id.clone();
            let records = Arc::clone(records);
            match task::spawn_blocking(move || records.save(&record)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(record_id = %record_id, error = %e, "Failed to save diagnosis record")
                }
                Err(e) => {
                    warn!(record_id = %record_id, error = %e, "Diagnosis record task failed")
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::snapshot;
    use crate::models::AnalysisSource;
    use crate::store::StoreResult;

    fn ranker() -> DiagnosisRanker {
        let kb = snapshot::from_json_str(
            r#"{
                "Flu": {"primary": {"fever": 0.6, "cough": 0.5}, "secondary": {"fatigue": 0.3}},
                "Cold": {"primary": {"sneezing": 0.7}, "secondary": {"runny nose": 0.4}}
            }"#,
        )
        .unwrap();
        DiagnosisRanker::new(Arc::new(kb))
    }

    struct BrokenRecords;

    impl DiagnosisRecordStore for BrokenRecords {
        fn save(&self, _record: &DiagnosisRecord) -> StoreResult<()> {
            Err(StoreError::Backend("disk full".into()))
        }
    }

    struct ThreadRecordingHistory {
        lookup_thread: std::sync::Mutex<Option<std::thread::ThreadId>>,
    }

    impl PatientHistoryStore for ThreadRecordingHistory {
        fn get_history(&self, _patient_id: &str) -> StoreResult<Option<PatientHistory>> {
            *self.lookup_thread.lock().unwrap() = Some(std::thread::current().id());
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_history_lookup_runs_off_async_thread() {
        let history = Arc::new(ThreadRecordingHistory {
            lookup_thread: std::sync::Mutex::new(None),
        });
        let service = DiagnosisService::new(ranker(), history.clone());

        service
            .diagnose("P001", ["fever"], Vec::<String>::new())
            .await
            .unwrap();

        let lookup_thread = history.lookup_thread.lock().unwrap().unwrap();
        assert_ne!(lookup_thread, std::thread::current().id());
    }

    #[tokio::test]
    async fn test_diagnose_records_report() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let service = DiagnosisService::new(ranker(), store.clone())
            .with_record_store(store.clone());

        let report = service
            .diagnose("P001", ["Fever", "cough"], ["fatigue"])
            .await
            .unwrap();

        assert_eq!(report.source, AnalysisSource::Local);
        assert_eq!(report.diagnoses[0], "Flu");

        let records = store.list_diagnosis_records("P001").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].report, report);
        assert_eq!(records[0].primary_symptoms, vec!["fever", "cough"]);
    }

    #[tokio::test]
    async fn test_history_required() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let service = DiagnosisService::new(ranker(), store.clone())
            .with_history_policy(HistoryPolicy::Required);

        let result = service.diagnose("P404", ["fever"], Vec::<String>::new()).await;
        assert!(matches!(result, Err(DxError::PatientNotFound(_))));

        store
            .upsert_patient_history(&PatientHistory::empty("P404"))
            .unwrap();
        let result = service.diagnose("P404", ["fever"], Vec::<String>::new()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_history_flows_into_summary() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let mut history = PatientHistory::empty("P001");
        history.previous_conditions = vec!["Asthma".into(), "Hypertension".into()];
        store.upsert_patient_history(&history).unwrap();

        let service = DiagnosisService::new(ranker(), store);
        let report = service
            .diagnose("P001", ["sneezing"], ["runny nose"])
            .await
            .unwrap();

        assert_eq!(report.diagnoses, vec!["Cold"]);
        assert!(report
            .analysis_summary
            .ends_with("The patient's history includes: Asthma, Hypertension"));
    }

    #[tokio::test]
    async fn test_record_failure_does_not_affect_report() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let plain = DiagnosisService::new(ranker(), store.clone());
        let broken =
            DiagnosisService::new(ranker(), store).with_record_store(Arc::new(BrokenRecords));

        let expected = plain
            .diagnose("P001", ["fever"], ["fatigue"])
            .await
            .unwrap();
        let actual = broken
            .diagnose("P001", ["fever"], ["fatigue"])
            .await
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_available_symptoms() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let service = DiagnosisService::new(ranker(), store);
        let vocabulary = service.available_symptoms();

        assert_eq!(vocabulary.primary(), &["cough", "fever", "sneezing"]);
        assert_eq!(vocabulary.secondary(), &["fatigue", "runny nose"]);
    }
}
