//! Knowledge snapshot persistence.
//!
//! The current format is a versioned envelope:
//!
//! ```json
//! { "format_version": 2, "fingerprint": "<sha256 hex>", "diseases": { .. } }
//! ```
//!
//! A bare `disease → profile` mapping (format 1) is upgraded on load.
//! Any other shape is rejected.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{fingerprint_profiles, KnowledgeBase, KnowledgeLoadError, KnowledgeResult};
use crate::analysis::normalize;
use crate::models::DiseaseProfile;

/// Format version written by [`save`].
pub const SNAPSHOT_FORMAT_VERSION: u64 = 2;

const LEGACY_FORMAT_VERSION: u64 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    format_version: u64,
    fingerprint: String,
    diseases: BTreeMap<String, DiseaseProfile>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u64,
    fingerprint: String,
    diseases: &'a BTreeMap<String, DiseaseProfile>,
}

/// Serialize a knowledge base as a pretty-printed envelope.
pub fn to_json(knowledge: &KnowledgeBase) -> KnowledgeResult<String> {
    let envelope = SnapshotRef {
        format_version: SNAPSHOT_FORMAT_VERSION,
        fingerprint: knowledge.fingerprint()?,
        diseases: knowledge.as_map(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Write a snapshot file.
pub fn save(knowledge: &KnowledgeBase, path: impl AsRef<Path>) -> KnowledgeResult<()> {
    let path = path.as_ref();
    let json = to_json(knowledge)?;
    fs::write(path, json)?;
    info!(
        path = %path.display(),
        disease_count = knowledge.len(),
        "Saved knowledge snapshot"
    );
    Ok(())
}

/// Parse and validate a snapshot.
pub fn from_json_str(json: &str) -> KnowledgeResult<KnowledgeBase> {
    let profiles = parse_profiles(json, true)?;
    KnowledgeBase::from_profiles(profiles)
}

/// Load and validate a snapshot file.
pub fn load(path: impl AsRef<Path>) -> KnowledgeResult<KnowledgeBase> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let knowledge = from_json_str(&json)?;
    info!(
        path = %path.display(),
        disease_count = knowledge.len(),
        "Loaded knowledge snapshot"
    );
    Ok(knowledge)
}

/// Read raw profiles without invariant checks, for auditing.
///
/// Shape and version are still enforced; the fingerprint and the
/// primary/secondary disjointness are not.
pub fn read_profiles_lenient(
    path: impl AsRef<Path>,
) -> KnowledgeResult<BTreeMap<String, DiseaseProfile>> {
    let json = fs::read_to_string(path)?;
    parse_profiles(&json, false)
}

fn parse_profiles(json: &str, verify: bool) -> KnowledgeResult<BTreeMap<String, DiseaseProfile>> {
    let value: Value = serde_json::from_str(json)?;

    let object = match &value {
        Value::Object(map) => map,
        Value::Array(_) => {
            return Err(KnowledgeLoadError::UnsupportedShape(
                "list of disease rows; rebuild the snapshot from the case dataset".into(),
            ))
        }
        other => {
            return Err(KnowledgeLoadError::UnsupportedShape(format!(
                "expected a JSON object, found {}",
                json_kind(other)
            )))
        }
    };

    let mut profiles = match object.get("format_version") {
        Some(version) => {
            let version = version.as_u64().ok_or_else(|| {
                KnowledgeLoadError::UnsupportedShape("format_version is not an integer".into())
            })?;
            match version {
                SNAPSHOT_FORMAT_VERSION => {
                    let envelope: SnapshotEnvelope = serde_json::from_value(value)?;
                    if verify {
                        let actual = fingerprint_profiles(&envelope.diseases)?;
                        if actual != envelope.fingerprint {
                            return Err(KnowledgeLoadError::Corrupt {
                                expected: envelope.fingerprint,
                                actual,
                            });
                        }
                    }
                    envelope.diseases
                }
                LEGACY_FORMAT_VERSION => {
                    let diseases = object.get("diseases").cloned().ok_or_else(|| {
                        KnowledgeLoadError::UnsupportedShape(
                            "format 1 envelope without diseases".into(),
                        )
                    })?;
                    upgrade_legacy(diseases)?
                }
                other => return Err(KnowledgeLoadError::UnsupportedVersion(other)),
            }
        }
        None => upgrade_legacy(value)?,
    };

    for (name, profile) in profiles.iter_mut() {
        profile.disease_name = name.clone();
    }
    Ok(profiles)
}

fn upgrade_legacy(value: Value) -> KnowledgeResult<BTreeMap<String, DiseaseProfile>> {
    let raw: BTreeMap<String, DiseaseProfile> = serde_json::from_value(value)?;
    let profiles = raw
        .into_iter()
        .map(|(name, mut profile)| {
            profile.primary = normalize_keys(&name, "primary", profile.primary)?;
            profile.secondary = normalize_keys(&name, "secondary", profile.secondary)?;
            Ok((name, profile))
        })
        .collect::<KnowledgeResult<BTreeMap<_, _>>>()?;
    warn!(
        disease_count = profiles.len(),
        from = LEGACY_FORMAT_VERSION,
        to = SNAPSHOT_FORMAT_VERSION,
        "Upgrading legacy knowledge snapshot"
    );
    Ok(profiles)
}

/// Legacy snapshots kept symptoms as reported; fold them to normalized keys.
fn normalize_keys(
    disease: &str,
    tier: &str,
    symptoms: BTreeMap<String, f64>,
) -> KnowledgeResult<BTreeMap<String, f64>> {
    let mut normalized = BTreeMap::new();
    for (raw, frequency) in symptoms {
        let key = normalize(&raw);
        if key.is_empty() {
            return Err(KnowledgeLoadError::Invalid(format!(
                "{}: blank {} symptom",
                disease, tier
            )));
        }
        if normalized.insert(key.clone(), frequency).is_some() {
            return Err(KnowledgeLoadError::Invalid(format!(
                "{}: {} symptoms collide as '{}' after normalization",
                disease, tier, key
            )));
        }
    }
    Ok(normalized)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
