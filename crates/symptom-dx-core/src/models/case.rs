//! Case-level dataset rows.

use serde::{Deserialize, Serialize};

/// One observed (disease, symptom) pairing from the clinical case dataset.
///
/// Repeated pairs are expected; their counts drive symptom frequencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseRecord {
    pub disease: String,
    pub symptom: String,
}

impl CaseRecord {
    pub fn new(disease: impl Into<String>, symptom: impl Into<String>) -> Self {
        Self {
            disease: disease.into(),
            symptom: symptom.into(),
        }
    }
}
