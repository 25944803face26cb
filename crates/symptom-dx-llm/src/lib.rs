//! LLM-backed symptom analysis for symptom-dx.
//!
//! Builds analysis prompts, extracts structured analyses from free-form
//! model output, and provides two [`ExternalAnalysisAdapter`]
//! implementations: [`GeminiAnalyzer`] (feature `gemini`) and
//! [`CannedAnalyzer`] for offline runs.
//!
//! [`ExternalAnalysisAdapter`]: symptom_dx_core::ranker::ExternalAnalysisAdapter

pub mod canned;
pub mod extraction;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod prompts;

pub use canned::*;
pub use extraction::*;
#[cfg(feature = "gemini")]
pub use gemini::*;
pub use prompts::*;
