//! Answer resolver: knowledge match, then generation fallback, then optional speech.

use crate::error::{GenerationError, ResolveError, SynthesisError};
use crate::knowledge::LocalMatcher;
use crate::shared::AnswerResult;
use std::sync::Arc;
use std::time::Duration;

/// Answer given when nothing matched and no generator is configured.
pub const FALLBACK_ANSWER: &str = "Unable to understand your question.";

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// External text-generation capability. Single-turn: receives the raw question only.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, question: &str) -> Result<String, GenerationError>;
}

/// External speech capability. Returns the complete audio, base64-encoded.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<String, SynthesisError>;
}

/// Which branch produced the answer text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Knowledge,
    Generated,
    Fixed,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Knowledge => "knowledge",
            AnswerSource::Generated => "generated",
            AnswerSource::Fixed => "fixed",
        }
    }
}

/// Runs one question through the pipeline. Holds no per-request state, so one
/// instance serves all requests concurrently.
pub struct AnswerResolver {
    matcher: LocalMatcher,
    generator: Option<Arc<dyn TextGenerator>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    call_timeout: Duration,
}

impl AnswerResolver {
    /// Knowledge-only resolver: no generation, no audio.
    pub fn new(matcher: LocalMatcher) -> Self {
        Self {
            matcher,
            generator: None,
            synthesizer: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn audio_enabled(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn generation_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn resolve(&self, question: &str) -> Result<AnswerResult, ResolveError> {
        self.resolve_detailed(question).await.map(|(result, _)| result)
    }

    /// Same as [`resolve`](Self::resolve), also reporting which branch answered.
    ///
    /// Audio failure is fail-closed: a valid text answer is discarded and the
    /// synthesis error is returned instead.
    pub async fn resolve_detailed(
        &self,
        question: &str,
    ) -> Result<(AnswerResult, AnswerSource), ResolveError> {
        if question.trim().is_empty() {
            return Err(ResolveError::EmptyQuestion);
        }

        let (answer, source) = match self.matcher.match_question(question) {
            Some(answer) => (answer, AnswerSource::Knowledge),
            None => match &self.generator {
                Some(generator) => (
                    self.generate(generator.as_ref(), question).await?,
                    AnswerSource::Generated,
                ),
                None => (FALLBACK_ANSWER.to_string(), AnswerSource::Fixed),
            },
        };

        let audio = match &self.synthesizer {
            Some(synthesizer) => {
                let audio = self
                    .synthesize(synthesizer.as_ref(), &answer)
                    .await
                    .map_err(|e| match source {
                        AnswerSource::Fixed => ResolveError::FallbackSynthesis(e),
                        _ => ResolveError::Synthesis(e),
                    })?;
                Some(audio)
            }
            None => None,
        };

        tracing::info!(
            target: "askbot::resolver",
            source = source.as_str(),
            answer_chars = answer.chars().count(),
            audio = audio.is_some(),
            "Question resolved"
        );
        Ok((AnswerResult { answer, audio }, source))
    }

    async fn generate(
        &self,
        generator: &dyn TextGenerator,
        question: &str,
    ) -> Result<String, GenerationError> {
        tracing::debug!(target: "askbot::resolver", generator = generator.name(), "No knowledge match; generating");
        tokio::time::timeout(self.call_timeout, generator.generate(question))
            .await
            .map_err(|_| GenerationError::Timeout(self.call_timeout))?
    }

    async fn synthesize(
        &self,
        synthesizer: &dyn SpeechSynthesizer,
        text: &str,
    ) -> Result<String, SynthesisError> {
        tracing::debug!(target: "askbot::resolver", synthesizer = synthesizer.name(), "Synthesizing answer");
        tokio::time::timeout(self.call_timeout, synthesizer.synthesize(text))
            .await
            .map_err(|_| SynthesisError::Timeout(self.call_timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{KnowledgeStore, SeededPicker};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const KB: &str = r#"{
        "greeting": { "keywords": ["hello"], "responses": "Hello! How can I help?" },
        "mood": { "keywords": ["how are you"], "responses": ["Great!", "Never better."] }
    }"#;

    enum GenBehavior {
        Answer(&'static str),
        Fail,
        Hang,
    }

    struct StubGenerator {
        behavior: GenBehavior,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl StubGenerator {
        fn new(behavior: GenBehavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for StubGenerator {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, question: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(question.to_string());
            match self.behavior {
                GenBehavior::Answer(a) => Ok(a.to_string()),
                GenBehavior::Fail => Err(GenerationError::Transport("connection refused".into())),
                GenBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok("late".to_string())
                }
            }
        }
    }

    struct StubSynth {
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubSynth {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl SpeechSynthesizer for StubSynth {
        fn name(&self) -> &str {
            "stub"
        }

        async fn synthesize(&self, text: &str) -> Result<String, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SynthesisError::Stream("reset by peer".into()))
            } else {
                Ok(format!("audio:{}", text))
            }
        }
    }

    struct HangingSynth;

    #[async_trait::async_trait]
    impl SpeechSynthesizer for HangingSynth {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn synthesize(&self, _text: &str) -> Result<String, SynthesisError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    fn matcher() -> LocalMatcher {
        let store = Arc::new(KnowledgeStore::from_json_str(KB).unwrap());
        LocalMatcher::with_picker(store, Arc::new(SeededPicker::new(1)))
    }

    #[tokio::test]
    async fn test_local_match_skips_generator() {
        let generator = StubGenerator::new(GenBehavior::Answer("generated"));
        let resolver = AnswerResolver::new(matcher()).with_generator(generator.clone());
        let (result, source) = resolver.resolve_detailed("hello").await.unwrap();
        assert_eq!(result, AnswerResult::text("Hello! How can I help?"));
        assert_eq!(source, AnswerSource::Knowledge);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_local_match_with_audio() {
        let synth = StubSynth::new(false);
        let resolver = AnswerResolver::new(matcher()).with_synthesizer(synth.clone());
        let result = resolver.resolve("Hello there").await.unwrap();
        assert_eq!(result.audio.as_deref(), Some("audio:Hello! How can I help?"));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_match_falls_through_to_generator_with_raw_question() {
        let generator = StubGenerator::new(GenBehavior::Answer("Paris."));
        let resolver = AnswerResolver::new(matcher()).with_generator(generator.clone());
        let (result, source) = resolver
            .resolve_detailed("What is the capital of France?")
            .await
            .unwrap();
        assert_eq!(result, AnswerResult::text("Paris."));
        assert_eq!(source, AnswerSource::Generated);
        assert_eq!(
            *generator.seen.lock().unwrap(),
            vec!["What is the capital of France?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_generated_answer_is_synthesized_when_audio_enabled() {
        let resolver = AnswerResolver::new(matcher())
            .with_generator(StubGenerator::new(GenBehavior::Answer("Paris.")))
            .with_synthesizer(StubSynth::new(false));
        let result = resolver.resolve("capital of France?").await.unwrap();
        assert_eq!(result, AnswerResult::with_audio("Paris.", "audio:Paris.".to_string()));
    }

    #[tokio::test]
    async fn test_generation_failure_is_terminal() {
        let synth = StubSynth::new(false);
        let resolver = AnswerResolver::new(matcher())
            .with_generator(StubGenerator::new(GenBehavior::Fail))
            .with_synthesizer(synth.clone());
        let err = resolver.resolve("asdkjhasd").await.unwrap_err();
        assert!(matches!(err, ResolveError::Generation(GenerationError::Transport(_))));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fixed_fallback_without_generator() {
        let resolver = AnswerResolver::new(matcher());
        let (result, source) = resolver.resolve_detailed("asdkjhasd").await.unwrap();
        assert_eq!(result, AnswerResult::text(FALLBACK_ANSWER));
        assert_eq!(source, AnswerSource::Fixed);
    }

    #[tokio::test]
    async fn test_fixed_fallback_is_synthesized() {
        let resolver = AnswerResolver::new(matcher()).with_synthesizer(StubSynth::new(false));
        let result = resolver.resolve("asdkjhasd").await.unwrap();
        assert_eq!(result.answer, FALLBACK_ANSWER);
        assert_eq!(result.audio, Some(format!("audio:{}", FALLBACK_ANSWER)));
    }

    #[tokio::test]
    async fn test_synthesis_failure_discards_text_answer() {
        let resolver = AnswerResolver::new(matcher()).with_synthesizer(StubSynth::new(true));
        let err = resolver.resolve("hello").await.unwrap_err();
        assert!(matches!(err, ResolveError::Synthesis(SynthesisError::Stream(_))));
    }

    #[tokio::test]
    async fn test_fallback_synthesis_failure_has_own_variant() {
        let resolver = AnswerResolver::new(matcher()).with_synthesizer(StubSynth::new(true));
        let err = resolver.resolve("asdkjhasd").await.unwrap_err();
        assert!(matches!(err, ResolveError::FallbackSynthesis(_)));
    }

    #[tokio::test]
    async fn test_blank_question_rejected_before_any_call() {
        let generator = StubGenerator::new(GenBehavior::Answer("x"));
        let synth = StubSynth::new(false);
        let resolver = AnswerResolver::new(matcher())
            .with_generator(generator.clone())
            .with_synthesizer(synth.clone());
        for q in ["", "   ", "\n\t"] {
            assert!(matches!(
                resolver.resolve(q).await,
                Err(ResolveError::EmptyQuestion)
            ));
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let resolver = AnswerResolver::new(matcher())
            .with_generator(StubGenerator::new(GenBehavior::Hang))
            .with_call_timeout(Duration::from_millis(20));
        let err = resolver.resolve("asdkjhasd").await.unwrap_err();
        assert!(matches!(err, ResolveError::Generation(GenerationError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_synthesis_timeout() {
        let resolver = AnswerResolver::new(matcher())
            .with_synthesizer(Arc::new(HangingSynth))
            .with_call_timeout(Duration::from_millis(20));
        let err = resolver.resolve("hello").await.unwrap_err();
        assert!(matches!(err, ResolveError::Synthesis(SynthesisError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_empty_store_sends_everything_to_generator() {
        let generator = StubGenerator::new(GenBehavior::Answer("generated"));
        let matcher = LocalMatcher::new(Arc::new(KnowledgeStore::empty()));
        let resolver = AnswerResolver::new(matcher).with_generator(generator.clone());
        let result = resolver.resolve("hello").await.unwrap();
        assert_eq!(result.answer, "generated");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }
}
