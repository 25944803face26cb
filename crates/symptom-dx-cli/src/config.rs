//! Runtime configuration from `.env`, the environment and CLI flags.
//!
//! Precedence, lowest to highest: built-in defaults, environment
//! (including anything `dotenvy` loaded), command-line flags.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use symptom_dx_core::ranker::DEFAULT_ANALYSIS_TIMEOUT;
use symptom_dx_core::HistoryPolicy;
use symptom_dx_llm::GeminiConfig;

pub const DEFAULT_SNAPSHOT_PATH: &str = "disease_symptoms.json";
pub const DEFAULT_DB_PATH: &str = "symptom_dx.db";

pub const SNAPSHOT_ENV_VAR: &str = "SYMPTOM_DX_SNAPSHOT";
pub const DB_ENV_VAR: &str = "SYMPTOM_DX_DB";
pub const TIMEOUT_ENV_VAR: &str = "SYMPTOM_DX_ANALYSIS_TIMEOUT_SECS";
pub const HISTORY_REQUIRED_ENV_VAR: &str = "SYMPTOM_DX_HISTORY_REQUIRED";

#[derive(Debug, Clone)]
pub struct Config {
    pub snapshot_path: PathBuf,
    pub db_path: PathBuf,
    pub analysis_timeout: Duration,
    pub history_policy: HistoryPolicy,
    /// `None` when no API key is configured
    pub gemini: Option<GeminiConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let analysis_timeout = match value(TIMEOUT_ENV_VAR) {
            Some(raw) => {
                parse_timeout(&raw).with_context(|| format!("Invalid {}", TIMEOUT_ENV_VAR))?
            }
            None => DEFAULT_ANALYSIS_TIMEOUT,
        };

        let history_required = match value(HISTORY_REQUIRED_ENV_VAR) {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("Invalid {}", HISTORY_REQUIRED_ENV_VAR))?,
            None => false,
        };
        let history_policy = if history_required {
            HistoryPolicy::Required
        } else {
            HistoryPolicy::Optional
        };

        Ok(Self {
            snapshot_path: value(SNAPSHOT_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            db_path: value(DB_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            analysis_timeout,
            history_policy,
            gemini: GeminiConfig::from_lookup(&lookup),
        })
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, snapshot: Option<PathBuf>, db: Option<PathBuf>) -> Self {
        if let Some(snapshot) = snapshot {
            self.snapshot_path = snapshot;
        }
        if let Some(db) = db {
            self.db_path = db;
        }
        self
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse()?;
    if secs == 0 {
        bail!("timeout must be at least one second");
    }
    Ok(Duration::from_secs(secs))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, found {:?}", other),
    }
}
