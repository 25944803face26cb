//! Differential ranking.
//!
//! Policy, first match wins:
//! 1. No symptoms → insufficient-data report.
//! 2. An external adapter answers within the timeout with at least one
//!    condition → report built from that analysis.
//! 3. Otherwise → local Jaccard scoring against the knowledge base.
//!
//! Adapter failures never escape [`DiagnosisRanker::rank`].

mod adapter;
mod local;
mod summary;

pub use adapter::*;
pub use local::*;
pub use summary::*;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::analysis::{RelationshipFinder, SeverityEstimator, SeverityTable};
use crate::knowledge::KnowledgeBase;
use crate::models::{
    AnalysisSource, DiagnosticReport, PatientHistory, StructuredAnalysis, SymptomReport,
    GENERAL_EXAMINATION,
};

/// Default bound on a single external analysis call.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum Jaccard score (exclusive) for a local match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.10;

/// Ranking configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RankerConfig {
    pub analysis_timeout: Duration,
    pub similarity_threshold: f64,
    /// Tests recommended with a locally scored report
    pub fallback_tests: Vec<String>,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            fallback_tests: vec![
                GENERAL_EXAMINATION.to_string(),
                "Blood work".to_string(),
                "Imaging studies".to_string(),
            ],
        }
    }
}

/// Ranks candidate diagnoses for a symptom report.
///
/// Holds only shared, read-only state; concurrent calls to
/// [`rank`](Self::rank) are independent.
#[derive(Debug, Clone)]
pub struct DiagnosisRanker {
    knowledge: Arc<KnowledgeBase>,
    severity: Arc<SeverityTable>,
    config: RankerConfig,
}

impl DiagnosisRanker {
    /// Create a ranker with a severity table seeded from the knowledge base.
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        let severity = Arc::new(SeverityTable::from_knowledge(&knowledge));
        Self {
            knowledge,
            severity,
            config: RankerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RankerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_severity_table(mut self, severity: Arc<SeverityTable>) -> Self {
        self.severity = severity;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Produce a ranked differential.
    ///
    /// Never fails: adapter errors and timeouts fall through to local
    /// scoring, and an empty report yields the insufficient-data shape.
    #[instrument(
        skip_all,
        fields(
            patient_id = %history.patient_id,
            primary = report.primary.len(),
            secondary = report.secondary.len()
        )
    )]
    pub async fn rank(
        &self,
        report: &SymptomReport,
        history: &PatientHistory,
        external: Option<&dyn ExternalAnalysisAdapter>,
    ) -> DiagnosticReport {
        if report.is_empty() {
            info!("No symptoms reported");
            return DiagnosticReport::insufficient(NO_SYMPTOMS_SUMMARY);
        }

        let severity =
            SeverityEstimator::new(&self.severity).assess(&report.primary, &report.secondary);
        let relationships = RelationshipFinder::new().find(&report.combined());
        debug!(
            overall_severity = severity.overall,
            relationships = relationships.len(),
            "Assessed symptoms"
        );

        let external_report = match external {
            Some(adapter) => self.rank_externally(adapter, report, history).await,
            None => None,
        };

        let mut ranked = match external_report {
            Some(ranked) => ranked,
            None => self.rank_locally(report, history),
        };

        ranked.severity = severity;
        ranked.relationships = relationships;
        ranked
    }

    async fn rank_externally(
        &self,
        adapter: &dyn ExternalAnalysisAdapter,
        report: &SymptomReport,
        history: &PatientHistory,
    ) -> Option<DiagnosticReport> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.config.analysis_timeout,
            adapter.analyze(&report.primary, &report.secondary, history),
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let analysis = match outcome {
            Ok(Ok(analysis)) => analysis.sanitized(),
            Ok(Err(failure)) => {
                warn!(
                    adapter = adapter.name(),
                    elapsed_ms,
                    error = %failure,
                    "External analysis failed, using local scoring"
                );
                return None;
            }
            Err(_) => {
                warn!(
                    adapter = adapter.name(),
                    elapsed_ms,
                    timeout_ms = self.config.analysis_timeout.as_millis() as u64,
                    "External analysis timed out, using local scoring"
                );
                return None;
            }
        };

        if !analysis.has_conditions() {
            info!(
                adapter = adapter.name(),
                elapsed_ms, "External analysis named no conditions, using local scoring"
            );
            return None;
        }

        info!(
            adapter = adapter.name(),
            elapsed_ms,
            conditions = analysis.possible_conditions.len(),
            "Ranked from external analysis"
        );
        Some(report_from_analysis(analysis, history))
    }

    fn rank_locally(&self, report: &SymptomReport, history: &PatientHistory) -> DiagnosticReport {
        let scored = score_diseases(&self.knowledge, report, self.config.similarity_threshold);

        if scored.is_empty() {
            info!(
                disease_count = self.knowledge.len(),
                "No disease above similarity threshold"
            );
            return DiagnosticReport::insufficient(NO_MATCH_SUMMARY);
        }

        let (diagnoses, scores): (Vec<String>, Vec<f64>) = scored.iter().cloned().unzip();
        let summary = local_summary(
            &diagnoses,
            &scores,
            &report.primary,
            &report.secondary,
            history,
        );

        info!(matches = scored.len(), top = %diagnoses[0], "Ranked locally");
        DiagnosticReport::ranked(
            scored,
            self.config.fallback_tests.clone(),
            summary,
            AnalysisSource::Local,
        )
    }
}

/// Build a report from a sanitized analysis with at least one condition.
fn report_from_analysis(analysis: StructuredAnalysis, history: &PatientHistory) -> DiagnosticReport {
    let summary = external_summary(&analysis, history);

    let mut tests: Vec<String> = Vec::new();
    for condition in &analysis.possible_conditions {
        for test in &condition.recommended_tests {
            if !tests.contains(test) {
                tests.push(test.clone());
            }
        }
    }

    let scored = analysis
        .possible_conditions
        .iter()
        .map(|c| (c.name.clone(), c.confidence))
        .collect();

    let mut report = DiagnosticReport::ranked(scored, tests, summary, AnalysisSource::External);
    report.severity_assessment =
        Some(analysis.severity_assessment).filter(|s| !s.is_empty());
    report.urgent_care_needed = analysis.urgent_care_needed;
    report.recommendations = analysis.recommendations;
    report.history_analysis = Some(analysis.history_analysis);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::snapshot;
    use crate::models::{PossibleCondition, INSUFFICIENT_DATA};
    use async_trait::async_trait;

    fn ranker() -> DiagnosisRanker {
        let kb = snapshot::from_json_str(
            r#"{
                "Flu": {"primary": {"fever": 0.6, "cough": 0.5}, "secondary": {"fatigue": 0.3}},
                "Cold": {"primary": {"sneezing": 0.7}, "secondary": {"cough": 0.4}}
            }"#,
        )
        .unwrap();
        DiagnosisRanker::new(Arc::new(kb))
    }

    struct Fixed(StructuredAnalysis);

    #[async_trait]
    impl ExternalAnalysisAdapter for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn analyze(
            &self,
            _primary: &[String],
            _secondary: &[String],
            _history: &PatientHistory,
        ) -> AdapterResult<StructuredAnalysis> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl ExternalAnalysisAdapter for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn analyze(
            &self,
            _primary: &[String],
            _secondary: &[String],
            _history: &PatientHistory,
        ) -> AdapterResult<StructuredAnalysis> {
            Err(AdapterFailure::Unparseable("not json".into()))
        }
    }

    #[tokio::test]
    async fn test_empty_report_is_insufficient() {
        let report = SymptomReport::default();
        let result = ranker()
            .rank(&report, &PatientHistory::default(), Some(&Failing))
            .await;

        assert_eq!(result.diagnoses, vec![INSUFFICIENT_DATA]);
        assert_eq!(result.confidence_scores, vec![1.0]);
        assert_eq!(result.recommended_tests, vec![GENERAL_EXAMINATION]);
        assert_eq!(result.analysis_summary, NO_SYMPTOMS_SUMMARY);
    }

    #[tokio::test]
    async fn test_local_ranking() {
        let report = SymptomReport::new(["fever", "cough"], Vec::<String>::new());
        let result = ranker()
            .rank(&report, &PatientHistory::default(), None)
            .await;

        assert_eq!(result.source, AnalysisSource::Local);
        assert_eq!(result.diagnoses[0], "Flu");
        assert_eq!(result.confidence_scores[0], 2.0 / 3.0);
        assert_eq!(
            result.recommended_tests,
            vec!["General physical examination", "Blood work", "Imaging studies"]
        );
        assert_eq!(result.severity.per_symptom["fever"], 0.75);
        assert_eq!(result.relationships.len(), 1);
    }

    #[tokio::test]
    async fn test_cross_tier_repeat_pairs_with_itself() {
        let report = SymptomReport::new(["fever"], ["Fever"]);
        let result = ranker()
            .rank(&report, &PatientHistory::default(), None)
            .await;

        assert_eq!(result.relationships.len(), 1);
        assert_eq!(
            result.relationships[0].symptoms,
            ("fever".to_string(), "fever".to_string())
        );
    }

    #[tokio::test]
    async fn test_external_tests_are_ordered_union() {
        let mut first = PossibleCondition::new("Migraine", 0.6);
        first.recommended_tests = vec!["MRI".into(), "CT".into()];
        let mut second = PossibleCondition::new("Tension headache", 0.9);
        second.recommended_tests = vec!["CT".into(), "Eye exam".into()];

        let adapter = Fixed(StructuredAnalysis {
            possible_conditions: vec![first, second],
            severity_assessment: "mild".into(),
            ..Default::default()
        });

        let report = SymptomReport::new(["headache"], Vec::<String>::new());
        let result = ranker()
            .rank(&report, &PatientHistory::default(), Some(&adapter))
            .await;

        assert_eq!(result.source, AnalysisSource::External);
        assert_eq!(result.diagnoses, vec!["Tension headache", "Migraine"]);
        assert_eq!(result.confidence_scores, vec![0.9, 0.6]);
        assert_eq!(result.recommended_tests, vec!["MRI", "CT", "Eye exam"]);
        assert_eq!(result.severity_assessment.as_deref(), Some("mild"));
        assert_eq!(result.analysis_summary, "Severity Assessment: mild");
    }

    #[tokio::test]
    async fn test_adapter_without_conditions_falls_back() {
        let adapter = Fixed(StructuredAnalysis {
            severity_assessment: "unclear".into(),
            ..Default::default()
        });

        let report = SymptomReport::new(["fever", "cough"], Vec::<String>::new());
        let result = ranker()
            .rank(&report, &PatientHistory::default(), Some(&adapter))
            .await;
        assert_eq!(result.source, AnalysisSource::Local);
    }

    #[tokio::test]
    async fn test_adapter_failure_matches_local() {
        let report = SymptomReport::new(["fever", "cough"], ["fatigue"]);
        let history = PatientHistory::default();
        let ranker = ranker();

        let failed = ranker.rank(&report, &history, Some(&Failing)).await;
        let local = ranker.rank(&report, &history, None).await;
        assert_eq!(failed, local);
    }

    #[tokio::test]
    async fn test_no_match_is_insufficient() {
        let report = SymptomReport::new(["numbness"], Vec::<String>::new());
        let result = ranker()
            .rank(&report, &PatientHistory::default(), None)
            .await;

        assert!(result.is_insufficient());
        assert_eq!(result.analysis_summary, NO_MATCH_SUMMARY);
    }

    #[test]
    fn test_default_config() {
        let config = RankerConfig::default();
        assert_eq!(config.analysis_timeout, Duration::from_secs(30));
        assert_eq!(config.similarity_threshold, 0.10);
        assert_eq!(config.fallback_tests.len(), 3);
    }
}
