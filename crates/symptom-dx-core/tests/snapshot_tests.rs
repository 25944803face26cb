//! Snapshot file round trips and the build → save → load → audit lifecycle.

use std::fs;
use std::io::Write;

use symptom_dx_core::knowledge::{
    audit_disjointness, build_from_path, snapshot, KnowledgeLoadError, SymptomFrequencyBuilder,
};
use symptom_dx_core::models::CaseRecord;

const DATASET_CSV: &str = "\
Diseases,Symptoms
Flu,fever
Flu,fever
Flu,cough
Flu,fatigue
Flu,headache
Common Cold,sneezing
Common Cold,\"runny nose\"
Common Cold,cough
";

#[test]
fn test_build_save_load() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("cases.csv");
    let snapshot_path = dir.path().join("disease_symptoms.json");

    fs::File::create(&dataset)
        .unwrap()
        .write_all(DATASET_CSV.as_bytes())
        .unwrap();

    let (kb, stats) = build_from_path(&dataset).unwrap();
    assert_eq!(stats.total_cases, 8);
    assert_eq!(stats.cases_per_disease["Flu"], 5);

    snapshot::save(&kb, &snapshot_path).unwrap();
    let loaded = snapshot::load(&snapshot_path).unwrap();
    assert_eq!(loaded, kb);

    let flu = loaded.get("Flu").unwrap();
    assert_eq!(flu.primary["fever"], 0.4);
    assert_eq!(flu.primary.len(), 3);
    assert_eq!(flu.secondary.len(), 1);
}

#[test]
fn test_rebuild_writes_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    let records = vec![
        CaseRecord::new("Flu", "fever"),
        CaseRecord::new("Flu", "cough"),
        CaseRecord::new("Cold", "sneezing"),
    ];

    snapshot::save(&SymptomFrequencyBuilder::new().build(&records), &first).unwrap();
    snapshot::save(&SymptomFrequencyBuilder::new().build(&records), &second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = snapshot::load(dir.path().join("missing.json"));
    assert!(matches!(result, Err(KnowledgeLoadError::Io(_))));
}

#[test]
fn test_legacy_fallback_list_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fallback.json");
    fs::write(&path, r#"[[{"Flu": "fever, cough, fatigue"}]]"#).unwrap();

    let result = snapshot::load(&path);
    assert!(matches!(result, Err(KnowledgeLoadError::UnsupportedShape(_))));
}

#[test]
fn test_overlap_rejected_on_load_but_audited_leniently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overlap.json");
    fs::write(
        &path,
        r#"{
            "Flu": {"primary": {"fever": 0.7, "cough": 0.5}, "secondary": {"fever": 0.1}},
            "Cold": {"primary": {"sneezing": 0.9}, "secondary": {}}
        }"#,
    )
    .unwrap();

    assert!(matches!(
        snapshot::load(&path),
        Err(KnowledgeLoadError::Invalid(_))
    ));

    let profiles = snapshot::read_profiles_lenient(&path).unwrap();
    let findings = audit_disjointness(&profiles);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].disease, "Flu");
    assert_eq!(findings[0].symptom, "fever");
}
