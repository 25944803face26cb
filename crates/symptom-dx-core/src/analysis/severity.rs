//! Symptom severity estimation.
//!
//! Primary symptoms weigh 1.5× their base severity; secondary symptoms use
//! the base value. The multiplier is never clamped, so a configured base
//! above 2/3 yields a per-symptom score above 1.0.

use std::collections::HashMap;

use crate::knowledge::KnowledgeBase;
use crate::models::SeverityAssessment;

use super::normalize;

/// Base severity for symptoms with no configured value.
pub const DEFAULT_BASE_SEVERITY: f64 = 0.5;

/// Multiplier applied to primary symptoms.
pub const PRIMARY_MULTIPLIER: f64 = 1.5;

/// Read-only table of base severities, keyed by normalized symptom.
#[derive(Debug, Clone)]
pub struct SeverityTable {
    base: HashMap<String, f64>,
    default: f64,
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SeverityTable {
    /// Create an empty table (every symptom gets the default).
    pub fn new() -> Self {
        Self {
            base: HashMap::new(),
            default: DEFAULT_BASE_SEVERITY,
        }
    }

    /// Seed every known symptom with the default base severity.
    pub fn from_knowledge(knowledge: &KnowledgeBase) -> Self {
        let base = knowledge
            .known_symptoms()
            .into_iter()
            .map(|s| (s.to_string(), DEFAULT_BASE_SEVERITY))
            .collect();
        Self {
            base,
            default: DEFAULT_BASE_SEVERITY,
        }
    }

    /// Set a custom base severity for a symptom.
    pub fn with_override(mut self, symptom: &str, severity: f64) -> Self {
        self.base.insert(normalize(symptom), severity);
        self
    }

    /// Base severity of a symptom.
    pub fn base_severity(&self, symptom: &str) -> f64 {
        self.base
            .get(&normalize(symptom))
            .copied()
            .unwrap_or(self.default)
    }

    /// Number of symptoms with an explicit entry.
    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }
}

/// Combines per-symptom severities into a case severity.
pub struct SeverityEstimator<'a> {
    table: &'a SeverityTable,
}

impl<'a> SeverityEstimator<'a> {
    pub fn new(table: &'a SeverityTable) -> Self {
        Self { table }
    }

    /// Assess a request's symptoms.
    ///
    /// A symptom listed in both tiers keeps its secondary score.
    pub fn assess(&self, primary: &[String], secondary: &[String]) -> SeverityAssessment {
        let mut assessment = SeverityAssessment::default();

        for symptom in primary {
            let score = self.table.base_severity(symptom) * PRIMARY_MULTIPLIER;
            assessment.per_symptom.insert(normalize(symptom), score);
        }
        for symptom in secondary {
            let score = self.table.base_severity(symptom);
            assessment.per_symptom.insert(normalize(symptom), score);
        }

        assessment.overall = if assessment.per_symptom.is_empty() {
            0.0
        } else {
            assessment.per_symptom.values().sum::<f64>() / assessment.per_symptom.len() as f64
        };

        assessment
    }
}
