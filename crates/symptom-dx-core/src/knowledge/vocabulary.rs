//! Known-symptom vocabulary.
//!
//! Two sorted, deduplicated lists: every symptom that is primary for any
//! disease, and the remaining symptoms that are only ever secondary.

use std::collections::BTreeSet;

use serde::Serialize;
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::analysis::normalize;
use crate::models::DiseaseProfile;

/// Minimum similarity for a vocabulary suggestion.
const MIN_SUGGESTION_SCORE: f64 = 0.70;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Vocabulary {
    primary: Vec<String>,
    secondary: Vec<String>,
}

impl Vocabulary {
    /// Derive the vocabulary from a set of profiles.
    pub fn from_profiles<'a>(profiles: impl IntoIterator<Item = &'a DiseaseProfile>) -> Self {
        let mut primary = BTreeSet::new();
        let mut secondary = BTreeSet::new();

        for profile in profiles {
            primary.extend(
                profile
                    .primary
                    .keys()
                    .map(|s| normalize(s))
                    .filter(|s| !s.is_empty()),
            );
            secondary.extend(
                profile
                    .secondary
                    .keys()
                    .map(|s| normalize(s))
                    .filter(|s| !s.is_empty()),
            );
        }

        // Primary takes priority so the two lists never overlap.
        let secondary = secondary.difference(&primary).cloned().collect();

        Self {
            primary: primary.into_iter().collect(),
            secondary,
        }
    }

    pub fn primary(&self) -> &[String] {
        &self.primary
    }

    pub fn secondary(&self) -> &[String] {
        &self.secondary
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }

    /// Check if a symptom is known, after normalization.
    pub fn contains(&self, symptom: &str) -> bool {
        let key = normalize(symptom);
        self.primary.binary_search(&key).is_ok() || self.secondary.binary_search(&key).is_ok()
    }

    /// Closest known symptoms to free text, best first.
    pub fn closest(&self, query: &str, limit: usize) -> Vec<(String, f64)> {
        let query = normalize(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(String, f64)> = self
            .primary
            .iter()
            .chain(self.secondary.iter())
            .map(|s| (s.clone(), fuzzy_match(&query, s)))
            .filter(|(_, score)| *score >= MIN_SUGGESTION_SCORE)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(limit);
        scored
    }
}

/// Combined Jaro-Winkler / Levenshtein similarity.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler favours shared prefixes, which suits typed symptom names.
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}
