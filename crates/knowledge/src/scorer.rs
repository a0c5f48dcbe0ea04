//! Weighted keyword relevance.
//!
//! Each query token earns points for every field it appears in: name
//! hits weigh most, summary and tag hits less, free-text details least.
//! Each distinct token found in the name adds a small bonus on top, so a
//! query naming the exhibit outranks one that merely overlaps its prose.

use std::collections::HashSet;

use crate::tokenize::{token_set, tokenize};
use crate::types::KnowledgeEntry;

pub const NAME_WEIGHT: f64 = 5.0;
pub const SUMMARY_WEIGHT: f64 = 3.0;
pub const TAG_WEIGHT: f64 = 3.0;
pub const DETAILS_WEIGHT: f64 = 1.0;
pub const NAME_COVERAGE_BONUS: f64 = 1.0;

const MAX_HIGHLIGHTS: usize = 3;

/// An entry's fields, tokenized once at load time.
#[derive(Debug, Clone, Default)]
pub struct PreparedEntry {
    name: HashSet<String>,
    summary: HashSet<String>,
    tags: HashSet<String>,
    details: HashSet<String>,
}

impl PreparedEntry {
    pub fn new(entry: &KnowledgeEntry) -> Self {
        Self {
            name: token_set(&entry.name),
            summary: token_set(&entry.summary),
            tags: entry.tags.iter().flat_map(|t| tokenize(t)).collect(),
            details: token_set(&entry.details),
        }
    }
}

/// Score `entry` against already-tokenized query tokens.
pub fn score(entry: &PreparedEntry, query_tokens: &[String]) -> f64 {
    let mut total = 0.0;
    let mut name_hits = 0usize;

    for token in query_tokens {
        if entry.name.contains(token) {
            total += NAME_WEIGHT;
            name_hits += 1;
        }
        if entry.summary.contains(token) {
            total += SUMMARY_WEIGHT;
        }
        if entry.tags.contains(token) {
            total += TAG_WEIGHT;
        }
        if entry.details.contains(token) {
            total += DETAILS_WEIGHT;
        }
    }

    total + NAME_COVERAGE_BONUS * name_hits as f64
}

/// Sentences from the summary and details that mention a query token,
/// falling back to the summary when none do.
pub fn highlights(entry: &KnowledgeEntry, query_tokens: &[String]) -> Vec<String> {
    let wanted: HashSet<&str> = query_tokens.iter().map(String::as_str).collect();

    let mut out: Vec<String> = sentences(&entry.summary)
        .chain(sentences(&entry.details))
        .filter(|s| tokenize(s).iter().any(|t| wanted.contains(t.as_str())))
        .take(MAX_HIGHLIGHTS)
        .map(str::to_owned)
        .collect();

    if out.is_empty() && !entry.summary.trim().is_empty() {
        out.push(entry.summary.trim().to_owned());
    }
    out
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
