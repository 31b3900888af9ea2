//! Immutable, ordered store of knowledge entries.

use crate::error::KnowledgeError;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Either one fixed response or a pool to pick from at random.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Responses {
    One(String),
    Many(Vec<String>),
}

impl Responses {
    pub fn len(&self) -> usize {
        match self {
            Responses::One(_) => 1,
            Responses::Many(all) => all.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the response at `index`; a single response ignores the index.
    pub fn get(&self, index: usize) -> Option<&str> {
        match self {
            Responses::One(text) => Some(text.as_str()),
            Responses::Many(all) => all.get(index).map(String::as_str),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let all: &[String] = match self {
            Responses::One(text) => std::slice::from_ref(text),
            Responses::Many(all) => all,
        };
        all.iter().map(String::as_str)
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.iter().any(|r| r == candidate)
    }
}

/// One category: keywords that trigger it and the responses it can give.
#[derive(Debug, Clone)]
pub struct KnowledgeEntry {
    category: String,
    /// Lowercased keywords, computed once at load.
    needles: Vec<String>,
    responses: Responses,
}

impl KnowledgeEntry {
    /// Builds an entry; requires at least one keyword and one response, none of them blank.
    pub fn new(
        category: impl Into<String>,
        keywords: Vec<String>,
        responses: Responses,
    ) -> Result<Self, KnowledgeError> {
        let category = category.into();
        let invalid = |reason: &str| KnowledgeError::Invalid {
            category: category.clone(),
            reason: reason.to_string(),
        };
        if keywords.is_empty() {
            return Err(invalid("no keywords"));
        }
        if keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(invalid("blank keyword"));
        }
        if responses.is_empty() {
            return Err(invalid("no responses"));
        }
        if responses.iter().any(|r| r.trim().is_empty()) {
            return Err(invalid("blank response"));
        }
        let needles = keywords.iter().map(|k| k.to_lowercase()).collect();
        Ok(Self {
            category,
            needles,
            responses,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn responses(&self) -> &Responses {
        &self.responses
    }

    /// True if any keyword occurs in the already-lowercased question.
    fn matches_lowered(&self, lowered_question: &str) -> bool {
        self.needles.iter().any(|n| lowered_question.contains(n.as_str()))
    }
}

#[derive(Deserialize)]
struct EntryBody {
    keywords: Vec<String>,
    responses: Responses,
}

/// JSON object read in document order (a plain map would lose it).
struct OrderedEntries(Vec<(String, EntryBody)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category name to { keywords, responses }")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((category, body)) = map.next_entry::<String, EntryBody>()? {
                    entries.push((category, body));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeStore {
    /// Store with no categories: every question falls through to the fallback.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a store from entries in match order. Category names must be unique.
    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Result<Self, KnowledgeError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.category.as_str()) {
                return Err(KnowledgeError::Invalid {
                    category: entry.category.clone(),
                    reason: "duplicate category".to_string(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Parses a JSON definition (see module docs).
    pub fn from_json_str(json: &str) -> Result<Self, KnowledgeError> {
        let OrderedEntries(raw) = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(category, body)| KnowledgeEntry::new(category, body.keywords, body.responses))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_entries(entries)
    }

    /// Reads and parses the definition file, reporting any failure.
    pub async fn try_load<P: AsRef<Path>>(path: P) -> Result<Self, KnowledgeError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&raw)
    }

    /// Like [`try_load`](Self::try_load), but a failure is logged and yields an empty store.
    pub async fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load(path).await {
            Ok(store) => {
                tracing::info!(
                    target: "askbot::knowledge",
                    path = %path.display(),
                    categories = store.len(),
                    "Knowledge base loaded"
                );
                store
            }
            Err(e) => {
                tracing::error!(
                    target: "askbot::knowledge",
                    path = %path.display(),
                    error = %e,
                    "Knowledge base failed to load; continuing with an empty store"
                );
                Self::empty()
            }
        }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.category.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry in store order with a keyword contained in `question`, ignoring case.
    pub fn find(&self, question: &str) -> Option<&KnowledgeEntry> {
        let lowered = question.to_lowercase();
        self.entries.iter().find(|e| e.matches_lowered(&lowered))
    }
}
