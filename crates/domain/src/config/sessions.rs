use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wake phrase
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeConfig {
    /// Trigger phrase that must prefix the first turn of a session.
    /// Matching is case-insensitive and tolerant of extra whitespace.
    #[serde(default = "d_phrase")]
    pub phrase: String,
    #[serde(default = "d_true")]
    pub required_on_first_turn: bool,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            phrase: d_phrase(),
            required_on_first_turn: true,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Longest accepted idle timeout: one week.
pub const MAX_IDLE_TIMEOUT_MS: u64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// A session with no contact for longer than this is expired on its
    /// next access.
    #[serde(default = "d_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Hard ceiling on turns per session. Reaching it ends the session
    /// after the answer is delivered.
    #[serde(default = "d_max_turns")]
    pub max_turns: u32,
    /// Number of most recent messages passed to the model as history.
    #[serde(default = "d_history_window")]
    pub history_window: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: d_idle_timeout_ms(),
            max_turns: d_max_turns(),
            history_window: d_history_window(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation archive
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "d_archive_path")]
    pub path: PathBuf,
    /// Oldest records beyond this count are dropped per session.
    #[serde(default = "d_retention")]
    pub retention_per_session: usize,
    /// How many archived exchanges seed a session that has no in-memory
    /// history (e.g. after a restart).
    #[serde(default = "d_context_records")]
    pub context_records: usize,
    /// Ancillary per-session notes (image-analysis summaries and the like).
    #[serde(default = "d_notes_path")]
    pub notes_path: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: d_archive_path(),
            retention_per_session: d_retention(),
            context_records: d_context_records(),
            notes_path: d_notes_path(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_phrase() -> String {
    "hey guide".into()
}
fn d_true() -> bool {
    true
}
fn d_idle_timeout_ms() -> u64 {
    30_000
}
fn d_max_turns() -> u32 {
    20
}
fn d_history_window() -> usize {
    12
}
fn d_archive_path() -> PathBuf {
    PathBuf::from("./data/conversations.json")
}
fn d_retention() -> usize {
    50
}
fn d_context_records() -> usize {
    5
}
fn d_notes_path() -> PathBuf {
    PathBuf::from("./data/notes.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_defaults() {
        let cfg = WakeConfig::default();
        assert_eq!(cfg.phrase, "hey guide");
        assert!(cfg.required_on_first_turn);
    }

    #[test]
    fn sessions_partial_toml_keeps_other_defaults() {
        let cfg: SessionsConfig = toml::from_str("idle_timeout_ms = 60000").unwrap();
        assert_eq!(cfg.idle_timeout_ms, 60_000);
        assert_eq!(cfg.max_turns, 20);
        assert_eq!(cfg.history_window, 12);
    }

    #[test]
    fn archive_defaults_live_under_data() {
        let cfg = ArchiveConfig::default();
        assert_eq!(cfg.path, PathBuf::from("./data/conversations.json"));
        assert_eq!(cfg.retention_per_session, 50);
        assert_eq!(cfg.context_records, 5);
    }
}
