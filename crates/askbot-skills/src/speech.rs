//! Speech synthesizer: streams audio from an OpenAI-compatible `/audio/speech` endpoint
//! and returns it base64-encoded.

use crate::truncate_error_body;
use askbot_core::{SpeechConfig, SpeechSynthesizer, SynthesisError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::{Stream, StreamExt};
use serde::Serialize;

const SYNTHESIZER_NAME: &str = "speech";

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Base64 (standard alphabet, padded) as expected by `data:audio/...;base64,` URLs.
pub fn encode_audio(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_audio(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded)
}

/// Drains `stream` into one buffer. Any chunk error aborts and the partial buffer is dropped.
///
/// The stream is owned here, so it is released on every return path.
pub async fn collect_audio<S, B, E>(stream: S) -> Result<Vec<u8>, SynthesisError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    futures_util::pin_mut!(stream);
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| SynthesisError::Stream(Box::new(e)))?;
        buffer.extend_from_slice(chunk.as_ref());
    }
    Ok(buffer)
}

/// Fixed-voice, fixed-format synthesizer.
pub struct SpeechClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    voice: String,
    format: String,
    api_key: String,
}

impl SpeechClient {
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        model: impl Into<String>,
        voice: impl Into<String>,
        format: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/audio/speech", api_base.trim_end_matches('/')),
            model: model.into(),
            voice: voice.into(),
            format: format.into(),
            api_key: api_key.into(),
        }
    }

    /// Returns `None` when no API key is configured.
    pub fn from_config(client: reqwest::Client, config: &SpeechConfig) -> Option<Self> {
        let key = config.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some(Self::new(
            client,
            &config.api_base,
            config.model.as_str(),
            config.voice.as_str(),
            config.format.as_str(),
            key,
        ))
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for SpeechClient {
    fn name(&self) -> &str {
        SYNTHESIZER_NAME
    }

    async fn synthesize(&self, text: &str) -> Result<String, SynthesisError> {
        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: &self.format,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(target: "askbot::speech", status = status.as_u16(), "Speech request rejected");
            return Err(SynthesisError::Rejected {
                status: status.as_u16(),
                body: truncate_error_body(body),
            });
        }

        let audio = collect_audio(response.bytes_stream()).await?;
        tracing::debug!(
            target: "askbot::speech",
            bytes = audio.len(),
            voice = %self.voice,
            format = %self.format,
            "Speech synthesized"
        );
        Ok(encode_audio(&audio))
    }
}
