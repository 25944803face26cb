//! Prompts for structured symptom analysis.
//!
//! The prompt text is opaque to the ranking pipeline; only the JSON shape
//! described in [`RESPONSE_FORMAT`] matters.

use symptom_dx_core::models::PatientHistory;

/// System context for the analysis request.
pub const SYSTEM_PROMPT: &str = r#"You are a clinical decision-support assistant. Review the patient's history before the current symptoms, then explain how the symptoms relate to or differ from previous conditions. You suggest possibilities for a clinician to review; you never give a final diagnosis."#;

/// Shape of the expected JSON response.
pub const RESPONSE_FORMAT: &str = r#"{
  "possible_conditions": [
    {
      "name": "condition name",
      "confidence": 0.0,
      "description": "short description",
      "recommended_tests": ["test"],
      "relation_to_history": "how the patient's history bears on this condition"
    }
  ],
  "severity_assessment": "overall severity of the presentation",
  "urgent_care_needed": false,
  "recommendations": ["next step"],
  "differential_notes": "what separates the candidates, and complications to watch for",
  "history_analysis": {
    "previous_conditions_impact": "effect of previous conditions",
    "medication_interactions": "relevant interactions with current medications",
    "risk_factors": ["risk factor"]
  }
}"#;

/// Guidelines appended after the response format.
pub const GUIDELINES: &[&str] = &[
    "Relate current symptoms to the patient's history first",
    "Flag complications that previous conditions make more likely",
    "Check current medications for interactions or contraindications",
    "Give each condition a confidence between 0 and 1",
    "List two or three conditions when the symptoms allow it",
    "Name specific tests",
    "Set urgent_care_needed when immediate attention is required",
    "Respond with valid JSON only",
];

/// Render the patient history block. Empty when there is nothing to show.
pub fn history_section(history: &PatientHistory) -> String {
    let mut section = String::new();

    let lists = [
        ("Previous Conditions", &history.previous_conditions),
        ("Current Medications", &history.current_medications),
        ("Allergies", &history.allergies),
    ];

    for (title, items) in lists {
        if items.is_empty() {
            continue;
        }
        if section.is_empty() {
            section.push_str("Patient History:\n");
        }
        section.push_str(&format!("\n{}:\n", title));
        for item in items.iter() {
            section.push_str(&format!("- {}\n", item));
        }
    }

    if let Some(visit) = history.latest_entry() {
        if section.is_empty() {
            section.push_str("Patient History:\n");
        }
        section.push_str(&format!(
            "\nMost Recent Visit ({}, {}):\n",
            visit.date, visit.entry_type
        ));
        if !visit.symptoms.is_empty() {
            section.push_str(&format!("- Symptoms: {}\n", visit.symptoms.join(", ")));
        }
        if let Some(diagnosis) = &visit.diagnosis {
            section.push_str(&format!("- Diagnosis: {}\n", diagnosis));
        }
    }

    section
}

fn symptom_line(symptoms: &[String]) -> String {
    if symptoms.is_empty() {
        "None reported".to_string()
    } else {
        symptoms.join(", ")
    }
}

/// Build the full analysis prompt for one request.
pub fn make_analysis_prompt(
    primary: &[String],
    secondary: &[String],
    history: &PatientHistory,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n\n");

    let history = history_section(history);
    if !history.is_empty() {
        prompt.push_str(&history);
        prompt.push('\n');
    }

    prompt.push_str("Current Symptoms:\n");
    prompt.push_str("Primary (more severe):\n");
    prompt.push_str(&symptom_line(primary));
    prompt.push_str("\n\nSecondary (less severe):\n");
    prompt.push_str(&symptom_line(secondary));

    prompt.push_str("\n\nRespond with a JSON object in this format:\n");
    prompt.push_str(RESPONSE_FORMAT);

    prompt.push_str("\n\nGuidelines:\n");
    for (i, guideline) in GUIDELINES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, guideline));
    }

    prompt
}
