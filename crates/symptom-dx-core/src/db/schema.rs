//! SQLite schema definition.

/// Complete database schema for symptom-dx.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patient History (read by the ranking pipeline, written by imports)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    patient_id TEXT PRIMARY KEY,
    previous_conditions TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    current_medications TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    allergies TEXT NOT NULL DEFAULT '[]',             -- JSON array of strings
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS history_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,                        -- order within the patient's history
    date TEXT NOT NULL,
    entry_type TEXT NOT NULL DEFAULT '',
    symptoms TEXT NOT NULL DEFAULT '[]',              -- JSON array of strings
    diagnosis TEXT,
    prescribed_medications TEXT NOT NULL DEFAULT '[]',
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_history_patient ON history_entries(patient_id, position);

-- ============================================================================
-- Diagnosis Records (append-only)
-- ============================================================================

-- No foreign key: a diagnosis may be recorded for a patient without history
CREATE TABLE IF NOT EXISTS diagnoses (
    record_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    primary_symptoms TEXT NOT NULL DEFAULT '[]',      -- JSON array of strings
    secondary_symptoms TEXT NOT NULL DEFAULT '[]',    -- JSON array of strings
    top_diagnosis TEXT,
    source TEXT NOT NULL,
    report TEXT NOT NULL                              -- JSON DiagnosticReport
);

CREATE INDEX IF NOT EXISTS idx_diagnoses_patient ON diagnoses(patient_id, recorded_at);
"#;
