//! Property tests for knowledge derivation and ranking invariants.

use std::sync::Arc;

use proptest::prelude::*;
use symptom_dx_core::knowledge::{primary_split, snapshot, SymptomFrequencyBuilder};
use symptom_dx_core::models::{CaseRecord, PatientHistory, SymptomReport};
use symptom_dx_core::DiagnosisRanker;

const DISEASES: &[&str] = &["Flu", "Cold", "Migraine", "Allergy", "Covid"];
const SYMPTOMS: &[&str] = &[
    "fever",
    "cough",
    "fatigue",
    "headache",
    "nausea",
    "sneezing",
    "runny nose",
    "chills",
    "Fever ",
    " COUGH",
];

fn case_records() -> impl Strategy<Value = Vec<CaseRecord>> {
    prop::collection::vec(
        (prop::sample::select(DISEASES), prop::sample::select(SYMPTOMS))
            .prop_map(|(d, s)| CaseRecord::new(d, s)),
        0..200,
    )
}

fn symptom_lists() -> impl Strategy<Value = (Vec<&'static str>, Vec<&'static str>)> {
    (
        prop::collection::vec(prop::sample::select(SYMPTOMS), 0..5),
        prop::collection::vec(prop::sample::select(SYMPTOMS), 0..5),
    )
}

proptest! {
    #[test]
    fn prop_tiers_are_disjoint(records in case_records()) {
        let kb = SymptomFrequencyBuilder::new().build(&records);
        for profile in kb.profiles() {
            prop_assert!(profile.overlapping_symptoms().is_empty());
        }
    }

    #[test]
    fn prop_primary_split(records in case_records()) {
        let kb = SymptomFrequencyBuilder::new().build(&records);
        for profile in kb.profiles() {
            let distinct = profile.symptom_set().len();
            prop_assert!(distinct >= 1);
            prop_assert!(!profile.primary.is_empty());
            prop_assert_eq!(profile.primary.len(), primary_split(distinct));
        }
    }

    #[test]
    fn prop_frequencies_in_range_and_ordered(records in case_records()) {
        let kb = SymptomFrequencyBuilder::new().build(&records);
        for profile in kb.profiles() {
            for frequency in profile.primary.values().chain(profile.secondary.values()) {
                prop_assert!(*frequency > 0.0 && *frequency <= 1.0);
            }
            let min_primary = profile.primary.values().cloned().fold(f64::INFINITY, f64::min);
            for frequency in profile.secondary.values() {
                prop_assert!(*frequency <= min_primary);
            }
        }
    }

    #[test]
    fn prop_rebuild_is_idempotent(records in case_records()) {
        let first = snapshot::to_json(&SymptomFrequencyBuilder::new().build(&records)).unwrap();
        let second = snapshot::to_json(&SymptomFrequencyBuilder::new().build(&records)).unwrap();
        prop_assert_eq!(&first, &second);

        // Reloading and re-saving is byte-identical too
        let reloaded = snapshot::from_json_str(&first).unwrap();
        prop_assert_eq!(snapshot::to_json(&reloaded).unwrap(), first);
    }

    #[test]
    fn prop_rank_lengths_and_order(
        records in case_records(),
        (primary, secondary) in symptom_lists(),
    ) {
        let kb = SymptomFrequencyBuilder::new().build(&records);
        let ranker = DiagnosisRanker::new(Arc::new(kb));
        let report = SymptomReport::new(primary, secondary);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let result = runtime.block_on(ranker.rank(&report, &PatientHistory::default(), None));

        prop_assert_eq!(result.diagnoses.len(), result.confidence_scores.len());
        prop_assert!(!result.diagnoses.is_empty());
        for pair in result.confidence_scores.windows(2) {
            prop_assert!(pair[0] >= pair[1]);
        }
        if report.is_empty() {
            prop_assert_eq!(result.diagnoses, vec!["Insufficient data".to_string()]);
            prop_assert_eq!(result.confidence_scores, vec![1.0]);
        }
    }
}
