//! Structured output of an external symptom analysis.
//!
//! Every field carries a serde default so that a response missing a field
//! deserializes to a typed empty value instead of failing. Type mismatches
//! still fail, which callers treat as an unparseable response.

use serde::{Deserialize, Deserializer, Serialize};

/// Confidence used when a condition omits one or sends a non-numeric value.
pub const DEFAULT_CONDITION_CONFIDENCE: f64 = 0.5;

/// Full structured analysis returned by an external reasoning service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StructuredAnalysis {
    #[serde(default)]
    pub possible_conditions: Vec<PossibleCondition>,
    #[serde(default)]
    pub severity_assessment: String,
    #[serde(default)]
    pub urgent_care_needed: bool,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub differential_notes: String,
    #[serde(default)]
    pub history_analysis: HistoryAnalysis,
}

/// One candidate condition from the external analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PossibleCondition {
    #[serde(default)]
    pub name: String,
    #[serde(
        default = "default_confidence",
        deserialize_with = "deserialize_confidence"
    )]
    pub confidence: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommended_tests: Vec<String>,
    #[serde(default)]
    pub relation_to_history: String,
}

/// How the patient's history bears on the current presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HistoryAnalysis {
    #[serde(default)]
    pub previous_conditions_impact: String,
    #[serde(default)]
    pub medication_interactions: String,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

impl StructuredAnalysis {
    /// Clamp confidences into [0, 1] and drop unnamed conditions.
    pub fn sanitized(mut self) -> Self {
        self.possible_conditions.retain(|c| !c.name.trim().is_empty());
        for condition in &mut self.possible_conditions {
            condition.name = condition.name.trim().to_string();
            condition.confidence = clamp_confidence(condition.confidence);
        }
        self
    }

    /// Check if the analysis names at least one condition.
    pub fn has_conditions(&self) -> bool {
        !self.possible_conditions.is_empty()
    }
}

impl PossibleCondition {
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
            description: String::new(),
            recommended_tests: Vec::new(),
            relation_to_history: String::new(),
        }
    }
}

/// Clamp a confidence into [0, 1]; NaN maps to the default confidence.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_CONDITION_CONFIDENCE
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn default_confidence() -> f64 {
    DEFAULT_CONDITION_CONFIDENCE
}

/// Accept numbers, numeric strings, or null for a confidence value.
fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let confidence = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(DEFAULT_CONDITION_CONFIDENCE),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .unwrap_or(DEFAULT_CONDITION_CONFIDENCE),
        _ => DEFAULT_CONDITION_CONFIDENCE,
    };
    Ok(confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let analysis: StructuredAnalysis =
            serde_json::from_str(r#"{"possible_conditions":[{"name":"Migraine"}]}"#).unwrap();

        assert_eq!(analysis.possible_conditions.len(), 1);
        assert_eq!(analysis.possible_conditions[0].confidence, 0.5);
        assert!(analysis.recommendations.is_empty());
        assert_eq!(analysis.severity_assessment, "");
        assert!(!analysis.urgent_care_needed);
        assert!(analysis.history_analysis.risk_factors.is_empty());
    }

    #[test]
    fn test_confidence_formats() {
        let analysis: StructuredAnalysis = serde_json::from_str(
            r#"{"possible_conditions":[
                {"name":"A","confidence":0.7},
                {"name":"B","confidence":"0.4"},
                {"name":"C","confidence":null},
                {"name":"D","confidence":"high"}
            ]}"#,
        )
        .unwrap();

        let scores: Vec<f64> = analysis
            .possible_conditions
            .iter()
            .map(|c| c.confidence)
            .collect();
        assert_eq!(scores, vec![0.7, 0.4, 0.5, 0.5]);
    }

    #[test]
    fn test_sanitized_clamps_and_drops_unnamed() {
        let analysis = StructuredAnalysis {
            possible_conditions: vec![
                PossibleCondition::new("High", 1.7),
                PossibleCondition::new("Low", -0.2),
                PossibleCondition::new("  ", 0.9),
            ],
            ..StructuredAnalysis::default()
        }
        .sanitized();

        assert_eq!(analysis.possible_conditions.len(), 2);
        assert_eq!(analysis.possible_conditions[0].confidence, 1.0);
        assert_eq!(analysis.possible_conditions[1].confidence, 0.0);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let result: Result<StructuredAnalysis, _> =
            serde_json::from_str(r#"{"possible_conditions":"Migraine"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_confidence(f64::NAN), 0.5);
        assert_eq!(clamp_confidence(0.25), 0.25);
    }
}
