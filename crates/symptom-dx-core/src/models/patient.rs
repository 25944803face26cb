//! Patient history models.

use serde::{Deserialize, Serialize};

/// Read-only clinical context for a patient.
///
/// The core never mutates a history; a patient without one is treated as
/// having an empty history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PatientHistory {
    /// External patient identifier (e.g., "P001")
    pub patient_id: String,
    /// Previously diagnosed conditions
    #[serde(default)]
    pub previous_conditions: Vec<String>,
    /// Medications the patient currently takes
    #[serde(default)]
    pub current_medications: Vec<String>,
    /// Known allergies
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Timestamped visit history
    #[serde(default)]
    pub medical_history: Vec<HistoryEntry>,
}

/// A single past visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HistoryEntry {
    /// Visit date (RFC 3339)
    pub date: String,
    /// Visit type (e.g., "Check-up", "Emergency", "Follow-up")
    #[serde(default, rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub prescribed_medications: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PatientHistory {
    /// Create an empty history for a patient.
    pub fn empty(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            ..Self::default()
        }
    }

    /// Check if there is nothing recorded for this patient.
    pub fn is_empty(&self) -> bool {
        self.previous_conditions.is_empty()
            && self.current_medications.is_empty()
            && self.allergies.is_empty()
            && self.medical_history.is_empty()
    }

    /// Most recent visit, by date string (RFC 3339 sorts lexically).
    pub fn latest_entry(&self) -> Option<&HistoryEntry> {
        self.medical_history.iter().max_by(|a, b| a.date.cmp(&b.date))
    }
}
