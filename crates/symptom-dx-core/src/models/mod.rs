//! Domain models for the symptom-dx system.

mod analysis;
mod case;
mod patient;
mod profile;
mod report;

pub use analysis::*;
pub use case::*;
pub use patient::*;
pub use profile::*;
pub use report::*;
