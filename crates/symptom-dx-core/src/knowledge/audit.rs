//! Offline data-quality audit over disease profiles.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::DiseaseProfile;

/// A symptom found in both the primary and secondary tier of one disease.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OverlapFinding {
    pub disease: String,
    pub symptom: String,
    pub primary_frequency: f64,
    pub secondary_frequency: f64,
}

/// Report every primary/secondary overlap, in disease then symptom order.
pub fn audit_disjointness(profiles: &BTreeMap<String, DiseaseProfile>) -> Vec<OverlapFinding> {
    let mut findings = Vec::new();
    for (disease, profile) in profiles {
        for symptom in profile.overlapping_symptoms() {
            findings.push(OverlapFinding {
                disease: disease.clone(),
                symptom: symptom.to_string(),
                primary_frequency: profile.primary[symptom],
                secondary_frequency: profile.secondary[symptom],
            });
        }
    }
    findings
}
