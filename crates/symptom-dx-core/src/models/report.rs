//! Per-request symptom input and diagnostic output models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::analysis::HistoryAnalysis;
use crate::analysis::normalize_all;

/// Diagnosis literal used when no specific diagnosis can be produced.
pub const INSUFFICIENT_DATA: &str = "Insufficient data";

/// Test recommended alongside an insufficient-data report.
pub const GENERAL_EXAMINATION: &str = "General physical examination";

/// Symptoms reported by a patient, split by the patient's own severity claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SymptomReport {
    /// More severe / prominent symptoms (normalized, deduplicated)
    pub primary: Vec<String>,
    /// Less severe / additional symptoms (normalized, deduplicated)
    pub secondary: Vec<String>,
}

impl SymptomReport {
    /// Normalize raw symptom text into a report.
    ///
    /// Blank tokens are dropped; each tier keeps first-occurrence order.
    /// The tiers are not reconciled against each other.
    pub fn new<P, S>(primary: P, secondary: S) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        Self {
            primary: normalize_all(primary),
            secondary: normalize_all(secondary),
        }
    }

    /// Check if no symptoms were reported in either tier.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }

    /// Primary followed by secondary, duplicates across tiers kept.
    pub fn combined(&self) -> Vec<String> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .cloned()
            .collect()
    }
}

/// Per-symptom and overall severity for a single request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SeverityAssessment {
    pub per_symptom: BTreeMap<String, f64>,
    pub overall: f64,
}

/// Kind of relationship between two reported symptoms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    CoOccurring,
}

/// A pair of symptoms flagged as related.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomRelationship {
    pub symptoms: (String, String),
    pub kind: RelationshipKind,
    pub strength: f64,
}

/// Which branch of the ranking policy produced a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    /// No symptoms, or nothing cleared the similarity threshold
    Insufficient,
    /// Built from an external structured analysis
    External,
    /// Built from local frequency/similarity scoring
    Local,
}

/// Ranked differential returned to the requester.
///
/// `diagnoses` and `confidence_scores` are index-aligned and ordered by
/// descending confidence; ties keep discovery order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticReport {
    pub diagnoses: Vec<String>,
    pub confidence_scores: Vec<f64>,
    pub recommended_tests: Vec<String>,
    pub analysis_summary: String,
    pub source: AnalysisSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_assessment: Option<String>,
    #[serde(default)]
    pub urgent_care_needed: bool,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_analysis: Option<HistoryAnalysis>,
    #[serde(default)]
    pub severity: SeverityAssessment,
    #[serde(default)]
    pub relationships: Vec<SymptomRelationship>,
}

impl DiagnosticReport {
    /// Fixed report used when there is not enough evidence to rank.
    pub fn insufficient(summary: impl Into<String>) -> Self {
        Self {
            diagnoses: vec![INSUFFICIENT_DATA.to_string()],
            confidence_scores: vec![1.0],
            recommended_tests: vec![GENERAL_EXAMINATION.to_string()],
            analysis_summary: summary.into(),
            source: AnalysisSource::Insufficient,
            severity_assessment: None,
            urgent_care_needed: false,
            recommendations: Vec::new(),
            history_analysis: None,
            severity: SeverityAssessment::default(),
            relationships: Vec::new(),
        }
    }

    /// Build a ranked report from (diagnosis, confidence) pairs.
    ///
    /// Pairs are stably sorted by descending confidence.
    pub fn ranked(
        mut scored: Vec<(String, f64)>,
        recommended_tests: Vec<String>,
        analysis_summary: String,
        source: AnalysisSource,
    ) -> Self {
        sort_by_confidence(&mut scored);
        let (diagnoses, confidence_scores): (Vec<String>, Vec<f64>) = scored.into_iter().unzip();
        Self {
            diagnoses,
            confidence_scores,
            recommended_tests,
            analysis_summary,
            source,
            severity_assessment: None,
            urgent_care_needed: false,
            recommendations: Vec::new(),
            history_analysis: None,
            severity: SeverityAssessment::default(),
            relationships: Vec::new(),
        }
    }

    /// Top-ranked diagnosis.
    pub fn top_diagnosis(&self) -> Option<(&str, f64)> {
        self.diagnoses
            .first()
            .zip(self.confidence_scores.first())
            .map(|(d, c)| (d.as_str(), *c))
    }

    /// Check if this is an insufficient-data report.
    pub fn is_insufficient(&self) -> bool {
        self.source == AnalysisSource::Insufficient
    }
}

/// Stable sort by descending confidence.
pub fn sort_by_confidence(scored: &mut [(String, f64)]) {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
}

/// A persisted diagnosis produced for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisRecord {
    /// Local UUID
    pub record_id: String,
    pub patient_id: String,
    /// Timestamp (RFC 3339)
    pub recorded_at: String,
    pub primary_symptoms: Vec<String>,
    pub secondary_symptoms: Vec<String>,
    pub report: DiagnosticReport,
}

impl DiagnosisRecord {
    /// Create a new record stamped with the current time.
    pub fn new(
        patient_id: impl Into<String>,
        symptoms: &SymptomReport,
        report: DiagnosticReport,
    ) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
            primary_symptoms: symptoms.primary.clone(),
            secondary_symptoms: symptoms.secondary.clone(),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symptom_report_normalizes() {
        let report = SymptomReport::new(["Fever", " fever ", "COUGH", ""], ["  Fatigue"]);
        assert_eq!(report.primary, vec!["fever", "cough"]);
        assert_eq!(report.secondary, vec!["fatigue"]);
        assert_eq!(report.combined(), vec!["fever", "cough", "fatigue"]);
    }

    #[test]
    fn test_symptom_report_keeps_cross_tier_overlap() {
        let report = SymptomReport::new(["fever"], ["Fever"]);
        assert_eq!(report.combined(), vec!["fever", "fever"]);
    }

    #[test]
    fn test_empty_report() {
        let report = SymptomReport::new(Vec::<String>::new(), ["   "]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_insufficient_report_shape() {
        let report = DiagnosticReport::insufficient("nothing to go on");
        assert_eq!(report.diagnoses, vec![INSUFFICIENT_DATA]);
        assert_eq!(report.confidence_scores, vec![1.0]);
        assert_eq!(report.recommended_tests, vec![GENERAL_EXAMINATION]);
        assert!(report.is_insufficient());
    }

    #[test]
    fn test_ranked_is_stable() {
        let report = DiagnosticReport::ranked(
            vec![
                ("A".into(), 0.4),
                ("B".into(), 0.9),
                ("C".into(), 0.4),
                ("D".into(), 0.6),
            ],
            vec![],
            String::new(),
            AnalysisSource::Local,
        );

        assert_eq!(report.diagnoses, vec!["B", "D", "A", "C"]);
        assert_eq!(report.confidence_scores, vec![0.9, 0.6, 0.4, 0.4]);
        assert_eq!(report.top_diagnosis(), Some(("B", 0.9)));
    }

    #[test]
    fn test_new_record() {
        let symptoms = SymptomReport::new(["fever"], ["cough"]);
        let record = DiagnosisRecord::new("P001", &symptoms, DiagnosticReport::insufficient("x"));
        assert_eq!(record.record_id.len(), 36); // UUID format
        assert_eq!(record.primary_symptoms, vec!["fever"]);
        assert_eq!(record.secondary_symptoms, vec!["cough"]);
    }
}
