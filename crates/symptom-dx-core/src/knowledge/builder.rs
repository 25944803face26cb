//! Offline derivation of disease profiles from case records.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use super::{load_dataset, DatasetResult, KnowledgeBase};
use crate::analysis::normalize;
use crate::models::{CaseRecord, DiseaseProfile};

/// Smallest frequency a profile may hold, so rare symptoms stay in (0, 1].
const MIN_FREQUENCY: f64 = 0.01;

/// Per-build dataset statistics.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BuildStats {
    /// Rows that contributed to a profile
    pub total_cases: usize,
    /// Contributing rows per disease
    pub cases_per_disease: BTreeMap<String, usize>,
    /// Rows dropped because the disease or symptom was blank
    pub skipped_rows: usize,
}

/// Builds a [`KnowledgeBase`] by counting symptom occurrences per disease.
///
/// The top 60% of a disease's distinct symptoms by frequency (at least
/// one) are primary; the rest are secondary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymptomFrequencyBuilder;

impl SymptomFrequencyBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Derive the knowledge base from case records.
    pub fn build(&self, records: &[CaseRecord]) -> KnowledgeBase {
        self.build_with_stats(records).0
    }

    /// Derive the knowledge base and report dataset statistics.
    pub fn build_with_stats(&self, records: &[CaseRecord]) -> (KnowledgeBase, BuildStats) {
        let mut stats = BuildStats::default();
        let mut counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();

        for record in records {
            let disease = record.disease.trim();
            let symptom = normalize(&record.symptom);
            if disease.is_empty() || symptom.is_empty() {
                debug!(disease = %record.disease, symptom = %record.symptom, "Skipping blank row");
                stats.skipped_rows += 1;
                continue;
            }

            *counts
                .entry(disease.to_string())
                .or_default()
                .entry(symptom)
                .or_insert(0) += 1;
            *stats
                .cases_per_disease
                .entry(disease.to_string())
                .or_insert(0) += 1;
            stats.total_cases += 1;
        }

        let profiles: BTreeMap<String, DiseaseProfile> = counts
            .into_iter()
            .map(|(disease, symptom_counts)| {
                let total = stats.cases_per_disease[&disease];
                let profile = build_profile(&disease, symptom_counts, total);
                (disease, profile)
            })
            .collect();

        info!(
            disease_count = profiles.len(),
            total_cases = stats.total_cases,
            skipped_rows = stats.skipped_rows,
            "Built disease profiles"
        );

        (KnowledgeBase::from_validated(profiles), stats)
    }
}

fn build_profile(disease: &str, counts: BTreeMap<String, usize>, total: usize) -> DiseaseProfile {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // Count descending, then name; BTreeMap order already gives the name tiebreak
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let primary_count = primary_split(ranked.len());
    let mut profile = DiseaseProfile::new(disease);

    for (rank, (symptom, count)) in ranked.into_iter().enumerate() {
        let frequency = round2(count as f64 / total as f64).max(MIN_FREQUENCY);
        if rank < primary_count {
            profile.primary.insert(symptom, frequency);
        } else {
            profile.secondary.insert(symptom, frequency);
        }
    }

    profile
}

/// Number of primary symptoms for `distinct` symptoms: ceil(0.6 × n), at least 1.
pub fn primary_split(distinct: usize) -> usize {
    if distinct == 0 {
        return 0;
    }
    ((distinct * 3 + 4) / 5).max(1)
}

/// Two decimals, exact halves to even (0.125 → 0.12, 0.625 → 0.62).
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Read a CSV or JSON dataset file and build from it.
pub fn build_from_path(path: impl AsRef<Path>) -> DatasetResult<(KnowledgeBase, BuildStats)> {
    let records = load_dataset(path)?;
    Ok(SymptomFrequencyBuilder::new().build_with_stats(&records))
}
