//! Disease profile models.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Default severity weight assigned to every derived profile.
pub const DEFAULT_SEVERITY_WEIGHT: f64 = 0.8;

/// Frequency-based symptom signature for one disease.
///
/// `primary` and `secondary` never share a key, and all frequencies are
/// computed against the same per-disease case count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseProfile {
    /// Disease name (the knowledge base key)
    #[serde(skip)]
    pub disease_name: String,
    /// High-frequency symptoms: symptom → frequency in (0, 1]
    pub primary: BTreeMap<String, f64>,
    /// Low-frequency symptoms: symptom → frequency in (0, 1]
    pub secondary: BTreeMap<String, f64>,
    /// Relative severity of the disease
    #[serde(default = "default_severity_weight")]
    pub severity_weight: f64,
    /// Curated recommended tests (empty unless populated externally)
    #[serde(default)]
    pub tests: Vec<String>,
}

fn default_severity_weight() -> f64 {
    DEFAULT_SEVERITY_WEIGHT
}

impl DiseaseProfile {
    /// Create an empty profile with default weight and no tests.
    pub fn new(disease_name: impl Into<String>) -> Self {
        Self {
            disease_name: disease_name.into(),
            primary: BTreeMap::new(),
            secondary: BTreeMap::new(),
            severity_weight: DEFAULT_SEVERITY_WEIGHT,
            tests: Vec::new(),
        }
    }

    /// All symptoms of this disease, primary and secondary.
    pub fn symptom_set(&self) -> BTreeSet<&str> {
        self.primary
            .keys()
            .chain(self.secondary.keys())
            .map(String::as_str)
            .collect()
    }

    /// Symptoms classified in both tiers. Empty for a well-formed profile.
    pub fn overlapping_symptoms(&self) -> Vec<&str> {
        self.primary
            .keys()
            .filter(|s| self.secondary.contains_key(*s))
            .map(String::as_str)
            .collect()
    }

    /// Frequency of a symptom in either tier.
    pub fn frequency(&self, symptom: &str) -> Option<f64> {
        self.primary
            .get(symptom)
            .or_else(|| self.secondary.get(symptom))
            .copied()
    }
}
