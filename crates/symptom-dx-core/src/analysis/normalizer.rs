//! Symptom token normalizer.
//!
//! Every symptom is trimmed and case-folded before lookup, storage or
//! comparison, so "Fever", " fever " and "FEVER" share one key.

use std::collections::HashSet;

/// Canonical form of a symptom token.
pub fn normalize(symptom: &str) -> String {
    symptom.trim().to_lowercase()
}

/// Normalize a list of symptoms, dropping blanks and later duplicates.
pub fn normalize_all<I>(symptoms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    symptoms
        .into_iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Split a comma-joined symptom string into normalized, non-empty tokens.
pub fn tokens(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(normalize)
        .filter(|s| !s.is_empty())
        .collect()
}
