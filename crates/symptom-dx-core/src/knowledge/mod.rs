//! Disease-symptom knowledge base.
//!
//! Two-phase lifecycle: [`SymptomFrequencyBuilder`] derives an immutable
//! [`KnowledgeBase`] from case records, and [`snapshot`] persists or reloads
//! it. Which phase runs is decided by the process entry point.

mod audit;
mod builder;
mod dataset;
pub mod snapshot;
mod vocabulary;

pub use audit::*;
pub use builder::*;
pub use dataset::*;
pub use vocabulary::*;

use std::collections::{BTreeMap, BTreeSet};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::analysis::normalize;
use crate::models::DiseaseProfile;

/// Errors reading a case dataset. Fatal to the build; no partial result.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors loading a knowledge snapshot. Fatal at process start.
#[derive(Error, Debug)]
pub enum KnowledgeLoadError {
    #[error("Cannot read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported snapshot shape: {0}")]
    UnsupportedShape(String),

    #[error("Unsupported snapshot format version: {0}")]
    UnsupportedVersion(u64),

    #[error("Snapshot fingerprint mismatch (expected {expected}, computed {actual})")]
    Corrupt { expected: String, actual: String },

    #[error("Invalid knowledge: {0}")]
    Invalid(String),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeLoadError>;

/// Immutable mapping of disease name to profile, with derived vocabulary.
///
/// Safe to share across threads; nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    profiles: BTreeMap<String, DiseaseProfile>,
    vocabulary: Vocabulary,
}

impl KnowledgeBase {
    /// Validate profiles and build a knowledge base.
    ///
    /// Rejects blank disease names, symptom keys that are not in normalized
    /// form, frequencies outside (0, 1], and any symptom classified as both
    /// primary and secondary.
    pub fn from_profiles(profiles: BTreeMap<String, DiseaseProfile>) -> KnowledgeResult<Self> {
        for (name, profile) in &profiles {
            if name.trim().is_empty() {
                return Err(KnowledgeLoadError::Invalid("blank disease name".into()));
            }
            for (symptom, frequency) in profile.primary.iter().chain(profile.secondary.iter()) {
                if symptom.is_empty() || normalize(symptom) != *symptom {
                    return Err(KnowledgeLoadError::Invalid(format!(
                        "{}: symptom key '{}' is not normalized",
                        name, symptom
                    )));
                }
                if !(*frequency > 0.0 && *frequency <= 1.0) {
                    return Err(KnowledgeLoadError::Invalid(format!(
                        "{}: frequency {} for '{}' is outside (0, 1]",
                        name, frequency, symptom
                    )));
                }
            }
        }

        let overlaps = audit_disjointness(&profiles);
        if let Some(first) = overlaps.first() {
            return Err(KnowledgeLoadError::Invalid(format!(
                "{} symptom(s) classified as both primary and secondary (first: '{}' in {})",
                overlaps.len(),
                first.symptom,
                first.disease
            )));
        }

        Ok(Self::from_validated(profiles))
    }

    /// Build from profiles already known to satisfy the invariants.
    pub(crate) fn from_validated(mut profiles: BTreeMap<String, DiseaseProfile>) -> Self {
        for (name, profile) in profiles.iter_mut() {
            profile.disease_name = name.clone();
        }
        let vocabulary = Vocabulary::from_profiles(profiles.values());
        Self {
            profiles,
            vocabulary,
        }
    }

    /// Look up a disease profile by name.
    pub fn get(&self, disease: &str) -> Option<&DiseaseProfile> {
        self.profiles.get(disease)
    }

    /// Profiles in disease-name order.
    pub fn profiles(&self) -> impl Iterator<Item = &DiseaseProfile> {
        self.profiles.values()
    }

    /// Raw name → profile map (serialization order).
    pub fn as_map(&self) -> &BTreeMap<String, DiseaseProfile> {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Display vocabulary derived from all profiles.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Every symptom known to any profile.
    pub fn known_symptoms(&self) -> BTreeSet<&str> {
        self.profiles.values().flat_map(|p| p.symptom_set()).collect()
    }

    /// SHA-256 over the canonical JSON of the profile map.
    pub fn fingerprint(&self) -> KnowledgeResult<String> {
        fingerprint_profiles(&self.profiles)
    }
}

/// Fingerprint of a profile map, as stored in snapshots.
pub(crate) fn fingerprint_profiles(
    profiles: &BTreeMap<String, DiseaseProfile>,
) -> KnowledgeResult<String> {
    // BTreeMap keys and struct field order make this serialization canonical.
    let canonical = serde_json::to_vec(profiles)?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(primary: &[(&str, f64)], secondary: &[(&str, f64)]) -> DiseaseProfile {
        let mut p = DiseaseProfile::new("");
        p.primary = primary.iter().map(|(s, f)| (s.to_string(), *f)).collect();
        p.secondary = secondary.iter().map(|(s, f)| (s.to_string(), *f)).collect();
        p
    }

    #[test]
    fn test_from_profiles_sets_names() {
        let mut map = BTreeMap::new();
        map.insert("Flu".to_string(), profile(&[("fever", 0.6)], &[("cough", 0.4)]));

        let kb = KnowledgeBase::from_profiles(map).unwrap();
        assert_eq!(kb.get("Flu").unwrap().disease_name, "Flu");
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.known_symptoms().len(), 2);
    }

    #[test]
    fn test_rejects_overlap() {
        let mut map = BTreeMap::new();
        map.insert("Flu".to_string(), profile(&[("fever", 0.6)], &[("fever", 0.4)]));

        let result = KnowledgeBase::from_profiles(map);
        assert!(matches!(result, Err(KnowledgeLoadError::Invalid(_))));
    }

    #[test]
    fn test_rejects_out_of_range_frequency() {
        let mut map = BTreeMap::new();
        map.insert("Flu".to_string(), profile(&[("fever", 1.2)], &[]));
        assert!(KnowledgeBase::from_profiles(map).is_err());

        let mut map = BTreeMap::new();
        map.insert("Flu".to_string(), profile(&[("fever", 0.0)], &[]));
        assert!(KnowledgeBase::from_profiles(map).is_err());
    }

    #[test]
    fn test_rejects_blank_disease() {
        let mut map = BTreeMap::new();
        map.insert("  ".to_string(), profile(&[("fever", 1.0)], &[]));
        assert!(KnowledgeBase::from_profiles(map).is_err());
    }

    #[test]
    fn test_fingerprint_stable() {
        let mut map = BTreeMap::new();
        map.insert("Flu".to_string(), profile(&[("fever", 0.6)], &[("cough", 0.4)]));

        let a = KnowledgeBase::from_profiles(map.clone()).unwrap();
        let b = KnowledgeBase::from_profiles(map).unwrap();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
    }

    #[test]
    fn test_rejects_unnormalized_symptom_key() {
        let mut map = BTreeMap::new();
        map.insert("Flu".to_string(), profile(&[("Fever", 0.6)], &[]));
        assert!(matches!(
            KnowledgeBase::from_profiles(map),
            Err(KnowledgeLoadError::Invalid(_))
        ));
    }
}
