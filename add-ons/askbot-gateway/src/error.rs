use askbot_core::ResolveError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const GENERATION_ERROR: &str = "Error generating an answer.";
pub const AUDIO_ERROR: &str = "Error generating the audio.";
pub const FALLBACK_AUDIO_ERROR: &str = "Error generating the audio for the fallback response.";
pub const EMPTY_QUESTION_ERROR: &str = "Question must not be empty.";

/// Client-facing error. Causes are logged; only the generic message is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(&'static str),
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::EmptyQuestion => Self::BadRequest(EMPTY_QUESTION_ERROR.to_string()),
            ResolveError::Generation(e) => {
                tracing::error!(target: "askbot::gateway", error = %e, "Generation failed");
                Self::Internal(GENERATION_ERROR)
            }
            ResolveError::Synthesis(e) => {
                tracing::error!(target: "askbot::gateway", error = %e, "Audio generation failed");
                Self::Internal(AUDIO_ERROR)
            }
            ResolveError::FallbackSynthesis(e) => {
                tracing::error!(target: "askbot::gateway", error = %e, "Audio generation for fallback response failed");
                Self::Internal(FALLBACK_AUDIO_ERROR)
            }
        }
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
