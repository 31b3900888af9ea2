//! Concrete capabilities behind the core's `TextGenerator` and `SpeechSynthesizer` traits.

pub use askbot_core::{SpeechSynthesizer, TextGenerator};

mod model_router;
mod speech;

pub use model_router::GeminiGenerator;
pub use speech::{collect_audio, decode_audio, encode_audio, SpeechClient};

/// Shared HTTP client; connection pool is reused by both capabilities.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()
}

/// Upper bound, in characters, on an upstream error body kept in an error value.
pub(crate) const MAX_ERROR_BODY: usize = 512;

pub(crate) fn truncate_error_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    body.chars().take(MAX_ERROR_BODY).collect()
}
