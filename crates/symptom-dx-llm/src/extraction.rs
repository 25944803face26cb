//! Structured analysis extraction from LLM output.

use symptom_dx_core::models::StructuredAnalysis;
use symptom_dx_core::ranker::AdapterFailure;
use thiserror::Error;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

impl From<ExtractionError> for AdapterFailure {
    fn from(e: ExtractionError) -> Self {
        AdapterFailure::Unparseable(e.to_string())
    }
}

/// Strip a surrounding markdown code fence, if present.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the language tag line (```json)
        if let Some(newline) = rest.find('\n') {
            let body = &rest[newline + 1..];
            if let Some(end) = body.rfind("```") {
                return body[..end].trim();
            }
        }
    }

    trimmed
}

/// Locate the JSON object in a response that may carry extra text.
pub fn extract_json(response: &str) -> ExtractionResult<&str> {
    let content = strip_code_fence(response);

    let json_start = content.find('{').ok_or_else(|| {
        ExtractionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = content.rfind('}').ok_or_else(|| {
        ExtractionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(ExtractionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    Ok(&content[json_start..=json_end])
}

/// Parse LLM output into a sanitized structured analysis.
///
/// Missing fields take typed defaults and confidences are clamped; any
/// other malformation is an error rather than a partial result.
pub fn parse_structured_analysis(response: &str) -> ExtractionResult<StructuredAnalysis> {
    let json = extract_json(response)?;
    let analysis: StructuredAnalysis = serde_json::from_str(json)?;
    Ok(analysis.sanitized())
}
