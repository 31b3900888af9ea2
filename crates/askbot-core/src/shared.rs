//! Shared types used across all askbot crates.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Outcome of one resolution: the answer text plus optional base64-encoded audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

impl AnswerResult {
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            audio: None,
        }
    }

    pub fn with_audio(answer: impl Into<String>, audio: String) -> Self {
        Self {
            answer: answer.into(),
            audio: Some(audio),
        }
    }
}

/// Text-generation capability settings (Gemini `generateContent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub enabled: bool,
    pub api_base: String,
    pub model: String,
    /// Supplied via environment (`ASKBOT__GENERATION__API_KEY`), never checked in.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Speech-synthesis capability settings. Voice and format are fixed per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub api_base: String,
    pub model: String,
    pub voice: String,
    pub format: String,
    /// Supplied via environment (`ASKBOT__SPEECH__API_KEY`), never checked in.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Global application configuration. Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub app_name: String,
    pub host: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// JSON file holding the category → keywords/responses definition.
    pub knowledge_path: String,
    /// Upper bound for each outbound capability call.
    pub call_timeout_secs: u64,
    pub generation: GenerationConfig,
    pub speech: SpeechConfig,
}

impl CoreConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }

    /// Load config from file and environment. Precedence: env `ASKBOT_CONFIG` path > `config/askbot.toml` > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("ASKBOT_CONFIG").unwrap_or_else(|_| "config/askbot.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Defaults, then `path` if it exists, then `ASKBOT__*` environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("app_name", "askbot")?
            .set_default("host", "127.0.0.1")?
            .set_default("port", 5000_i64)?
            .set_default("knowledge_path", "data/knowledge_base.json")?
            .set_default("call_timeout_secs", 30_i64)?
            .set_default("generation.enabled", true)?
            .set_default(
                "generation.api_base",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("generation.model", "gemini-1.5-flash")?
            .set_default("speech.enabled", true)?
            .set_default("speech.api_base", "https://api.openai.com/v1")?
            .set_default("speech.model", "tts-1")?
            .set_default("speech.voice", "onyx")?
            .set_default("speech.format", "mp3")?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("ASKBOT").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_apply_when_file_missing() {
        let config = CoreConfig::load_from(Path::new("/nonexistent/askbot.toml")).unwrap();
        assert_eq!(config.app_name, "askbot");
        assert_eq!(config.knowledge_path, "data/knowledge_base.json");
        assert_eq!(config.speech.format, "mp3");
        assert_eq!(config.call_timeout(), Duration::from_secs(config.call_timeout_secs));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "app_name = \"Front Desk\"\nknowledge_path = \"kb.json\"\n\n[speech]\nvoice = \"nova\"\nenabled = false"
        )
        .unwrap();
        let config = CoreConfig::load_from(file.path()).unwrap();
        assert_eq!(config.app_name, "Front Desk");
        assert_eq!(config.knowledge_path, "kb.json");
        assert_eq!(config.speech.voice, "nova");
        assert!(!config.speech.enabled);
        assert_eq!(config.speech.model, "tts-1");
    }

    #[test]
    fn test_answer_without_audio_omits_field() {
        let json = serde_json::to_value(AnswerResult::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "answer": "hi" }));
    }
}
