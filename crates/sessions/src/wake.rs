//! Wake-phrase detection on speech transcripts.
//!
//! Only a leading occurrence counts: "hey guide, what is this?" matches,
//! "I love hey guide trivia" does not. Matching ignores case and tolerates
//! irregular whitespace between the phrase's words.

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeMatch {
    pub matched: bool,
    /// The transcript with the wake phrase (and the punctuation after it)
    /// removed, trimmed. Equal to the trimmed input when nothing matched.
    pub stripped: String,
    pub wake_phrase: String,
}

/// A compiled wake phrase, reusable across requests.
#[derive(Debug, Clone)]
pub struct WakeMatcher {
    phrase: String,
    pattern: Option<Regex>,
}

impl WakeMatcher {
    pub fn new(phrase: &str) -> Self {
        let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
        let pattern = if words.is_empty() {
            None
        } else {
            // The character after the phrase must not continue a word, so
            // "hey guidebook" is not a match.
            let src = format!(r"(?is)^\s*{}(?P<rest>$|[^\w].*)", words.join(r"\s+"));
            Regex::new(&src).ok()
        };
        Self {
            phrase: phrase.to_owned(),
            pattern,
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn detect_and_strip(&self, text: &str) -> WakeMatch {
        let rest = self
            .pattern
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.name("rest"))
            .map(|m| m.as_str());

        match rest {
            Some(rest) => WakeMatch {
                matched: true,
                stripped: rest
                    .trim_start_matches(|c: char| c.is_whitespace() || is_separator(c))
                    .trim_end()
                    .to_owned(),
                wake_phrase: self.phrase.clone(),
            },
            None => WakeMatch {
                matched: false,
                stripped: text.trim().to_owned(),
                wake_phrase: self.phrase.clone(),
            },
        }
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ',' | '.' | '!' | '?' | ':' | ';' | '-' | '…')
}

/// One-shot form of [`WakeMatcher::detect_and_strip`].
pub fn detect_and_strip(text: &str, wake_phrase: &str) -> WakeMatch {
    WakeMatcher::new(wake_phrase).detect_and_strip(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_punctuation() {
        let m = detect_and_strip("hey guide, tell me about the fountain", "hey guide");
        assert!(m.matched);
        assert_eq!(m.stripped, "tell me about the fountain");
        assert_eq!(m.wake_phrase, "hey guide");
    }

    #[test]
    fn only_prefix_occurrences_count() {
        let m = detect_and_strip("I love hey guide trivia", "hey guide");
        assert!(!m.matched);
        assert_eq!(m.stripped, "I love hey guide trivia");
    }

    #[test]
    fn absent_phrase_returns_trimmed_input() {
        let m = detect_and_strip("   where is the exit?  ", "hey guide");
        assert!(!m.matched);
        assert_eq!(m.stripped, "where is the exit?");
    }

    #[test]
    fn case_and_whitespace_tolerant() {
        let m = detect_and_strip("  HEY \t  Guide   what's that tower", "hey   guide");
        assert!(m.matched);
        assert_eq!(m.stripped, "what's that tower");
    }

    #[test]
    fn word_boundary_required() {
        let m = detect_and_strip("hey guidebook please", "hey guide");
        assert!(!m.matched);
    }

    #[test]
    fn phrase_alone_strips_to_empty() {
        let m = detect_and_strip("Hey guide!", "hey guide");
        assert!(m.matched);
        assert_eq!(m.stripped, "");
    }

    #[test]
    fn empty_phrase_never_matches() {
        let m = detect_and_strip("hello there", "");
        assert!(!m.matched);
        assert_eq!(m.stripped, "hello there");

        let m = detect_and_strip("hello there", "   ");
        assert!(!m.matched);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let m = detect_and_strip("ok (guide) where now", "ok (guide)");
        assert!(m.matched);
        assert_eq!(m.stripped, "where now");

        let m = detect_and_strip("ok guide where now", "ok (guide)");
        assert!(!m.matched);
    }

    #[test]
    fn multiline_transcript() {
        let m = detect_and_strip("hey guide\nwhat is this?", "hey guide");
        assert!(m.matched);
        assert_eq!(m.stripped, "what is this?");
    }
}
