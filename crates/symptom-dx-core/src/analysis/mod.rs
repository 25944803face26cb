//! Per-request symptom analysis.
//!
//! Pipeline: Normalization → Severity Estimation → Relationship Detection

mod normalizer;
mod relationships;
mod severity;

pub use normalizer::*;
pub use relationships::*;
pub use severity::*;
