use std::time::Duration;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reading or validating the knowledge definition failed. The store degrades to empty.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("failed to read knowledge file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse knowledge file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid knowledge entry '{category}': {reason}")]
    Invalid { category: String, reason: String },
}

/// The external text-generation call failed.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[source] BoxError),
    #[error("generation service rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("generation response was malformed: {0}")]
    Malformed(String),
    #[error("generation service returned no candidate text")]
    EmptyCandidate,
    #[error("generation call timed out after {0:?}")]
    Timeout(Duration),
}

/// The external speech-synthesis call failed.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("speech request failed: {0}")]
    Transport(#[source] BoxError),
    #[error("speech service rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("audio stream broke mid-transfer: {0}")]
    Stream(#[source] BoxError),
    #[error("speech call timed out after {0:?}")]
    Timeout(Duration),
}

/// Terminal failure of one resolution. Never retried.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    /// Synthesis of the fixed "unable to understand" answer failed.
    #[error("fallback answer synthesis failed: {0}")]
    FallbackSynthesis(#[source] SynthesisError),
}
