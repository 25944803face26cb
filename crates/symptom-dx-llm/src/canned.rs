//! Offline adapter that replays a fixed response.

use async_trait::async_trait;
use symptom_dx_core::models::{PatientHistory, StructuredAnalysis};
use symptom_dx_core::ranker::{AdapterResult, ExternalAnalysisAdapter};
use tracing::debug;

use crate::extraction::parse_structured_analysis;

/// Returns the same response text for every request.
///
/// The text goes through the same extraction path as a live response, so
/// a malformed canned response fails the same way a live one would.
#[derive(Debug, Clone)]
pub struct CannedAnalyzer {
    response: String,
}

impl CannedAnalyzer {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    /// Replay a serialized analysis.
    pub fn from_analysis(analysis: &StructuredAnalysis) -> Self {
        Self::new(serde_json::to_string(analysis).unwrap_or_default())
    }

    pub fn response(&self) -> &str {
        &self.response
    }
}

#[async_trait]
impl ExternalAnalysisAdapter for CannedAnalyzer {
    fn name(&self) -> &str {
        "canned"
    }

    async fn analyze(
        &self,
        primary: &[String],
        secondary: &[String],
        _history: &PatientHistory,
    ) -> AdapterResult<StructuredAnalysis> {
        debug!(
            primary = primary.len(),
            secondary = secondary.len(),
            "Replaying canned analysis"
        );
        Ok(parse_structured_analysis(&self.response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symptom_dx_core::models::PossibleCondition;
    use symptom_dx_core::ranker::AdapterFailure;

    #[tokio::test]
    async fn test_replays_analysis() {
        let analysis = StructuredAnalysis {
            possible_conditions: vec![PossibleCondition::new("Migraine", 0.8)],
            ..Default::default()
        };
        let adapter = CannedAnalyzer::from_analysis(&analysis);

        let result = adapter
            .analyze(&["headache".to_string()], &[], &PatientHistory::default())
            .await
            .unwrap();
        assert_eq!(result, analysis);
    }

    #[tokio::test]
    async fn test_malformed_response_fails() {
        let adapter = CannedAnalyzer::new("no json here");
        let result = adapter
            .analyze(&[], &[], &PatientHistory::default())
            .await;
        assert!(matches!(result, Err(AdapterFailure::Unparseable(_))));
    }
}
