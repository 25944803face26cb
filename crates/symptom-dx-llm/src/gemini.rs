//! Gemini `generateContent` adapter.

use std::env;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use symptom_dx_core::models::{PatientHistory, StructuredAnalysis};
use symptom_dx_core::ranker::{AdapterFailure, AdapterResult, ExternalAnalysisAdapter};
use tracing::{debug, error, instrument, trace};

use crate::extraction::parse_structured_analysis;
use crate::prompts::make_analysis_prompt;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Configuration for the Gemini adapter
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Defaults to the public v1beta endpoint
    pub base_url: String,
    pub temperature: f32,
    /// Per-request HTTP timeout
    pub timeout: Option<Duration>,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: 0.2,
            timeout: None,
        }
    }

    /// Read `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_BASE_URL`.
    ///
    /// `None` when no non-empty API key is set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::new(non_empty("GEMINI_API_KEY")?);
        if let Some(model) = non_empty("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = non_empty("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        Some(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

// Gemini API request and response structures
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        trace!(finish_reason = ?candidate.finish_reason, "Completion finish reason");
        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Structured symptom analysis backed by the Gemini API.
pub struct GeminiAnalyzer {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiAnalyzer {
    #[instrument(name = "gemini_analyzer_new", skip(config), fields(model = %config.model))]
    pub fn new(config: GeminiConfig) -> AdapterResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AdapterFailure::Unavailable(
                "API key cannot be empty".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AdapterFailure::Unavailable(e.to_string()))?;

        debug!("Created Gemini analyzer");
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn generate(&self, prompt: String) -> AdapterResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                response_mime_type: "application/json".to_string(),
            },
        };

        let url = self.config.endpoint();
        debug!(url = %url, model = %self.config.model, "Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(handle_http_error)?;

        let response = check_response_status(response).await?;

        let completion: GenerateContentResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!(error = %e, "Failed to parse JSON response from Gemini API");
            AdapterFailure::Unparseable(e.to_string())
        })?;

        completion.into_text().ok_or_else(|| {
            error!("Gemini API returned no candidate text");
            AdapterFailure::Unparseable("No completion text returned".to_string())
        })
    }
}

#[async_trait]
impl ExternalAnalysisAdapter for GeminiAnalyzer {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn analyze(
        &self,
        primary: &[String],
        secondary: &[String],
        history: &PatientHistory,
    ) -> AdapterResult<StructuredAnalysis> {
        let prompt = make_analysis_prompt(primary, secondary, history);
        let text = self.generate(prompt).await?;
        trace!(content_len = text.len(), "Received analysis text");

        parse_structured_analysis(&text).map_err(|e| {
            error!(error = %e, "Failed to parse structured analysis");
            e.into()
        })
    }
}

/// Map a reqwest error, separating timeouts from other transport failures.
///
/// The URL is stripped so request details never reach logs or reports.
fn handle_http_error(e: reqwest::Error) -> AdapterFailure {
    let e = e.without_url();
    error!(error = %e, "HTTP request to Gemini failed");
    if e.is_timeout() {
        AdapterFailure::Timeout
    } else {
        AdapterFailure::Transport(e.to_string())
    }
}

/// Turn a non-2xx response into an API failure carrying the body text.
async fn check_response_status(response: reqwest::Response) -> AdapterResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    error!(status = %status, error = %message, "Gemini API returned error response");
    Err(AdapterFailure::Api {
        status: status.as_u16(),
        message,
    })
}
