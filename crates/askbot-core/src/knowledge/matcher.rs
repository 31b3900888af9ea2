//! Local matcher: resolves a question against the store without any external call.

use super::store::KnowledgeStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// Source of randomness for choosing among several responses.
pub trait ResponsePicker: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform choice from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngPicker;

impl ResponsePicker for ThreadRngPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic choice from a seeded RNG, for reproducible runs and tests.
#[derive(Debug)]
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ResponsePicker for SeededPicker {
    fn pick(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..len)
    }
}

/// First-match-wins keyword matcher over an immutable store.
#[derive(Clone)]
pub struct LocalMatcher {
    store: Arc<KnowledgeStore>,
    picker: Arc<dyn ResponsePicker>,
}

impl LocalMatcher {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self::with_picker(store, Arc::new(ThreadRngPicker))
    }

    pub fn with_picker(store: Arc<KnowledgeStore>, picker: Arc<dyn ResponsePicker>) -> Self {
        Self { store, picker }
    }

    /// Returns a response from the first matching category, or `None` (NoMatch).
    pub fn match_question(&self, question: &str) -> Option<String> {
        let entry = self.store.find(question)?;
        let responses = entry.responses();
        let index = match responses.len() {
            1 => 0,
            n => self.picker.pick(n).min(n - 1),
        };
        let answer = responses.get(index)?;
        tracing::debug!(
            target: "askbot::matcher",
            category = entry.category(),
            index,
            "Knowledge match"
        );
        Some(answer.to_string())
    }
}
