//! Curated venue knowledge: the static index and its relevance scorer.
//!
//! The index is loaded once at startup and never mutated, so it is shared
//! across requests behind a plain `Arc` with no locking.

pub mod index;
pub mod scorer;
pub mod tokenize;
pub mod types;

pub use index::KnowledgeIndex;
pub use types::{IndexMeta, KnowledgeEntry, KnowledgeIndexFile, KnowledgeMatch, Location};
