//! Generation fallback: sends the raw question to Gemini `generateContent` and returns the candidate text.

use crate::truncate_error_body;
use askbot_core::{GenerationConfig, GenerationError, TextGenerator};
use serde::{Deserialize, Serialize};

const GENERATOR_NAME: &str = "gemini";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Single-turn, stateless client for the Gemini REST API.
pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        model: &str,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/models/{}:generateContent",
                api_base.trim_end_matches('/'),
                model
            ),
            api_key: api_key.into(),
        }
    }

    /// Returns `None` when no API key is configured.
    pub fn from_config(client: reqwest::Client, config: &GenerationConfig) -> Option<Self> {
        let key = config.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some(Self::new(client, &config.api_base, &config.model, key))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Joins the text parts of the first candidate; blank output counts as no candidate.
fn candidate_text(body: &str) -> Result<String, GenerationError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyCandidate);
    }
    Ok(text.trim().to_string())
}

#[async_trait::async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        GENERATOR_NAME
    }

    async fn generate(&self, question: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: question }],
            }],
        };
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(Box::new(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(Box::new(e)))?;
        if !status.is_success() {
            tracing::warn!(target: "askbot::generation", status = status.as_u16(), "Generation rejected");
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                body: truncate_error_body(body),
            });
        }
        candidate_text(&body)
    }
}
