//! Seam to an external reasoning service.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{PatientHistory, StructuredAnalysis};

/// Why an external analysis produced nothing usable.
///
/// Every variant is absorbed by the ranker, which falls back to local scoring.
#[derive(Error, Debug)]
pub enum AdapterFailure {
    #[error("Analysis service unavailable: {0}")]
    Unavailable(String),

    #[error("Analysis timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unparseable analysis: {0}")]
    Unparseable(String),
}

pub type AdapterResult<T> = Result<T, AdapterFailure>;

/// Produces a structured analysis for a symptom report.
///
/// Implementations return either a complete, sanitized analysis or a
/// failure; never a partially parsed one.
#[async_trait]
pub trait ExternalAnalysisAdapter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn analyze(
        &self,
        primary: &[String],
        secondary: &[String],
        history: &PatientHistory,
    ) -> AdapterResult<StructuredAnalysis>;
}
