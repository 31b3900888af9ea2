//! askbot-core: data model, knowledge store, local matcher, and the answer resolver.
//!
//! External capabilities (text generation, speech synthesis) are consumed through the
//! traits in [`orchestrator`]; concrete HTTP clients live in `askbot-skills`.

mod error;
mod knowledge;
mod orchestrator;
mod shared;

pub use error::{GenerationError, KnowledgeError, ResolveError, SynthesisError};

pub use shared::{AnswerResult, CoreConfig, GenerationConfig, SpeechConfig};

pub use knowledge::{
    KnowledgeEntry, KnowledgeStore, LocalMatcher, ResponsePicker, Responses, SeededPicker,
    ThreadRngPicker,
};

pub use orchestrator::{
    AnswerResolver, AnswerSource, SpeechSynthesizer, TextGenerator, FALLBACK_ANSWER,
};
