//! Curated knowledge base: keyword rules loaded once at startup, matched first-wins.
//!
//! ## Definition file
//!
//! A JSON object mapping category name to its rule. Key order is match order.
//!
//! ```json
//! {
//!   "greeting": { "keywords": ["hello", "hi"], "responses": ["Hello!", "Hi there!"] },
//!   "hours":    { "keywords": ["open"],        "responses": "We open at nine." }
//! }
//! ```

mod matcher;
mod store;

pub use matcher::{LocalMatcher, ResponsePicker, SeededPicker, ThreadRngPicker};
pub use store::{KnowledgeEntry, KnowledgeStore, Responses};
