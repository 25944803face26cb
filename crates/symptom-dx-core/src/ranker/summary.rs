//! Human-readable rationale attached to each report.

use crate::models::{PatientHistory, StructuredAnalysis};

/// Summary when the request carries no symptoms.
pub const NO_SYMPTOMS_SUMMARY: &str = "Insufficient symptoms to generate a specific diagnosis.";

/// Summary when no disease clears the similarity threshold.
pub const NO_MATCH_SUMMARY: &str = "No specific diagnosis matches the provided symptoms. \
Please consult with a healthcare provider for a thorough evaluation.";

/// Compose the rationale for a report built from an external analysis.
///
/// Sections are emitted only when present: severity, urgent-care flag,
/// differential notes, recommendations, then prior conditions.
pub fn external_summary(analysis: &StructuredAnalysis, history: &PatientHistory) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !analysis.severity_assessment.is_empty() {
        parts.push(format!(
            "Severity Assessment: {}",
            analysis.severity_assessment
        ));
    }

    if analysis.urgent_care_needed {
        parts.push("\nURGENT CARE RECOMMENDED".to_string());
    }

    if !analysis.differential_notes.is_empty() {
        parts.push(format!(
            "\nDifferential Diagnosis Notes: {}",
            analysis.differential_notes
        ));
    }

    if !analysis.recommendations.is_empty() {
        parts.push("\nRecommendations:".to_string());
        parts.extend(analysis.recommendations.iter().map(|r| format!("• {}", r)));
    }

    if !history.previous_conditions.is_empty() {
        parts.push("\nRelevant Patient History:".to_string());
        parts.extend(
            history
                .previous_conditions
                .iter()
                .map(|c| format!("• Previous condition: {}", c)),
        );
    }

    parts.join("\n")
}

/// Compose the rationale for a locally scored report.
pub fn local_summary(
    diagnoses: &[String],
    scores: &[f64],
    primary: &[String],
    secondary: &[String],
    history: &PatientHistory,
) -> String {
    let scores: Vec<String> = scores.iter().map(|s| format!("{:?}", s)).collect();

    format!(
        "Based on the provided symptoms, the top diagnoses are: {} \
         with confidence scores: {} \
         The primary symptoms are: {} \
         and the secondary symptoms are: {} \
         The patient's history includes: {}",
        diagnoses.join(", "),
        scores.join(", "),
        primary.join(", "),
        secondary.join(", "),
        history.previous_conditions.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_summary_all_sections() {
        let analysis = StructuredAnalysis {
            severity_assessment: "moderate".into(),
            urgent_care_needed: true,
            differential_notes: "consider tension headache".into(),
            recommendations: vec!["rest".into(), "hydrate".into()],
            ..Default::default()
        };
        let history = PatientHistory {
            previous_conditions: vec!["asthma".into()],
            ..PatientHistory::empty("p1")
        };

        let summary = external_summary(&analysis, &history);
        assert_eq!(
            summary,
            "Severity Assessment: moderate\n\
             \nURGENT CARE RECOMMENDED\n\
             \nDifferential Diagnosis Notes: consider tension headache\n\
             \nRecommendations:\n\
             • rest\n\
             • hydrate\n\
             \nRelevant Patient History:\n\
             • Previous condition: asthma"
        );
    }

    #[test]
    fn test_external_summary_empty() {
        let summary = external_summary(&StructuredAnalysis::default(), &PatientHistory::default());
        assert!(summary.is_empty());
    }

    #[test]
    fn test_local_summary() {
        let summary = local_summary(
            &["Flu".into()],
            &[2.0 / 3.0],
            &["fever".into(), "cough".into()],
            &[],
            &PatientHistory::default(),
        );
        assert_eq!(
            summary,
            "Based on the provided symptoms, the top diagnoses are: Flu \
             with confidence scores: 0.6666666666666666 \
             The primary symptoms are: fever, cough \
             and the secondary symptoms are:  \
             The patient's history includes: "
        );
    }

    #[test]
    fn test_local_summary_whole_scores() {
        let summary = local_summary(
            &["Cold".into()],
            &[1.0],
            &["cough".into()],
            &[],
            &PatientHistory::default(),
        );
        assert!(summary.contains("confidence scores: 1.0 "));
    }
}
