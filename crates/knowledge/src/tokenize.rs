//! Query and entry tokenization.
//!
//! Lower-cases, splits on anything that is not a letter or digit, and drops
//! one-character fragments and a short list of function words that would
//! otherwise match every entry.

use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "in",
    "is", "it", "its", "me", "my", "of", "on", "or", "that", "the", "there", "this", "to", "was",
    "were", "what", "when", "where", "which", "who", "why", "with", "you",
];

fn keep(token: &str) -> bool {
    token.chars().count() >= 2 && !STOPWORDS.contains(&token)
}

/// Tokens in order of appearance, duplicates removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| keep(t))
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_owned)
        .collect()
}

/// Token set for membership tests.
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}
