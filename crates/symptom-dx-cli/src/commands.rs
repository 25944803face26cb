//! Subcommand handlers. Each writes its user-facing output to `out`.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;
use symptom_dx_core::knowledge::{audit_disjointness, build_from_path, snapshot};
use symptom_dx_core::{
    DiagnosisRanker, DiagnosisService, ExternalAnalysisAdapter, KnowledgeBase, PatientHistory,
    PatientHistoryStore, RankerConfig, SqliteStore,
};
use symptom_dx_llm::{CannedAnalyzer, GeminiAnalyzer};
use tracing::{info, warn};

use crate::config::Config;

/// Where the external analysis comes from for one `diagnose` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterChoice {
    /// Gemini when an API key is configured, otherwise none
    Configured,
    /// Local scoring only
    Offline,
    /// Replay a recorded model response from a file
    Canned(std::path::PathBuf),
}

pub fn build(
    config: &Config,
    dataset: &Path,
    output: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    let (knowledge, stats) = build_from_path(dataset)
        .with_context(|| format!("Failed to build from {}", dataset.display()))?;

    let output = output.unwrap_or(config.snapshot_path.as_path());
    snapshot::save(&knowledge, output)
        .with_context(|| format!("Failed to write snapshot {}", output.display()))?;

    writeln!(
        out,
        "Built {} disease profiles from {} cases ({} rows skipped)",
        knowledge.len(),
        stats.total_cases,
        stats.skipped_rows
    )?;
    for (disease, count) in &stats.cases_per_disease {
        writeln!(out, "  {}: {} cases", disease, count)?;
    }
    writeln!(out, "Snapshot written to {}", output.display())?;
    Ok(())
}

/// Fails when any disease lists a symptom in both tiers.
pub fn audit(config: &Config, path: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let path = path.unwrap_or(config.snapshot_path.as_path());
    let profiles = snapshot::read_profiles_lenient(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;

    let findings = audit_disjointness(&profiles);
    if findings.is_empty() {
        writeln!(out, "No overlapping symptoms in {} diseases", profiles.len())?;
        return Ok(());
    }

    for finding in &findings {
        writeln!(
            out,
            "{}: '{}' is primary ({}) and secondary ({})",
            finding.disease,
            finding.symptom,
            finding.primary_frequency,
            finding.secondary_frequency
        )?;
    }
    bail!("{} overlapping symptom(s) found", findings.len())
}

pub fn symptoms(
    config: &Config,
    like: Option<&str>,
    limit: usize,
    out: &mut impl Write,
) -> Result<()> {
    let knowledge = load_knowledge(config)?;
    let vocabulary = knowledge.vocabulary();

    match like {
        Some(query) => {
            let matches = vocabulary.closest(query, limit);
            if matches.is_empty() {
                writeln!(out, "No known symptom resembles '{}'", query)?;
            }
            for (symptom, score) in matches {
                writeln!(out, "{}\t{:.2}", symptom, score)?;
            }
        }
        None => writeln!(out, "{}", serde_json::to_string_pretty(vocabulary)?)?,
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryImport {
    Many(Vec<PatientHistory>),
    One(PatientHistory),
}

/// Accepts a single history object or an array of them.
pub fn import_history(config: &Config, file: &Path, out: &mut impl Write) -> Result<()> {
    let json = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let histories = match serde_json::from_str(&json)
        .with_context(|| format!("Invalid patient history JSON in {}", file.display()))?
    {
        HistoryImport::Many(histories) => histories,
        HistoryImport::One(history) => vec![history],
    };

    let store = open_store(config)?;
    for history in &histories {
        store.upsert_patient_history(history)?;
    }

    info!(count = histories.len(), "Imported patient histories");
    writeln!(
        out,
        "Imported {} patient histories into {}",
        histories.len(),
        config.db_path.display()
    )?;
    Ok(())
}

pub async fn diagnose(
    config: &Config,
    patient_id: &str,
    primary: &[String],
    secondary: &[String],
    adapter: AdapterChoice,
    out: &mut impl Write,
) -> Result<()> {
    let knowledge = load_knowledge(config)?;
    let ranker = DiagnosisRanker::new(Arc::new(knowledge)).with_config(RankerConfig {
        analysis_timeout: config.analysis_timeout,
        ..RankerConfig::default()
    });

    let store = Arc::new(open_store(config)?);
    let mut service = DiagnosisService::new(ranker, store.clone())
        .with_record_store(store)
        .with_history_policy(config.history_policy);
    if let Some(adapter) = make_adapter(config, adapter)? {
        info!(adapter = adapter.name(), "Using external analysis");
        service = service.with_adapter(adapter);
    }

    let report = service.diagnose(patient_id, primary, secondary).await?;
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

/// List every patient with a stored history and their diagnosis count.
pub fn list_patients(config: &Config, out: &mut impl Write) -> Result<()> {
    let store = open_store(config)?;
    let patient_ids = store.list_patient_ids()?;
    if patient_ids.is_empty() {
        writeln!(out, "No stored patient histories")?;
    }
    for patient_id in &patient_ids {
        let count = store.count_diagnosis_records(Some(patient_id.as_str()))?;
        writeln!(out, "{}\t{} diagnoses", patient_id, count)?;
    }
    Ok(())
}

pub fn history(config: &Config, patient_id: &str, out: &mut impl Write) -> Result<()> {
    let store = open_store(config)?;
    let history = store.get_history(patient_id)?;
    let diagnoses = store.list_diagnosis_records(patient_id)?;

    if history.is_none() && diagnoses.is_empty() {
        bail!("Patient not found: {}", patient_id);
    }

    let view = json!({
        "patient_id": patient_id,
        "history": history,
        "diagnoses": diagnoses,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
    Ok(())
}

fn load_knowledge(config: &Config) -> Result<KnowledgeBase> {
    snapshot::load(&config.snapshot_path).with_context(|| {
        format!(
            "Failed to load knowledge snapshot {}",
            config.snapshot_path.display()
        )
    })
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))
}

fn make_adapter(
    config: &Config,
    choice: AdapterChoice,
) -> Result<Option<Arc<dyn ExternalAnalysisAdapter>>> {
    match choice {
        AdapterChoice::Offline => Ok(None),
        AdapterChoice::Canned(path) => {
            let response = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read canned response {}", path.display()))?;
            Ok(Some(Arc::new(CannedAnalyzer::new(response))))
        }
        AdapterChoice::Configured => {
            let Some(gemini) = config.gemini.clone() else {
                info!("No GEMINI_API_KEY configured, using local scoring");
                return Ok(None);
            };
            match GeminiAnalyzer::new(gemini.with_timeout(config.analysis_timeout)) {
                Ok(analyzer) => Ok(Some(Arc::new(analyzer))),
                Err(e) => {
                    warn!(error = %e, "Gemini adapter unavailable, using local scoring");
                    Ok(None)
                }
            }
        }
    }
}
