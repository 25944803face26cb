//! Local similarity scoring against the knowledge base.

use std::collections::BTreeSet;

use crate::analysis::{normalize, tokens};
use crate::knowledge::KnowledgeBase;
use crate::models::{sort_by_confidence, SymptomReport};

/// Jaccard similarity of two token sets; 0.0 when both are empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Score every disease against the reported symptoms.
///
/// Returns diseases scoring strictly above `threshold`, stably sorted by
/// descending score; ties keep disease-name order.
pub fn score_diseases(
    knowledge: &KnowledgeBase,
    report: &SymptomReport,
    threshold: f64,
) -> Vec<(String, f64)> {
    let query: BTreeSet<String> = tokens(&report.combined().join(", ")).into_iter().collect();

    let mut scored: Vec<(String, f64)> = knowledge
        .profiles()
        .filter_map(|profile| {
            let signature: BTreeSet<String> = profile
                .symptom_set()
                .into_iter()
                .map(normalize)
                .filter(|s| !s.is_empty())
                .collect();
            let score = jaccard(&query, &signature);
            (score > threshold).then(|| (profile.disease_name.clone(), score))
        })
        .collect();

    sort_by_confidence(&mut scored);
    scored
}
