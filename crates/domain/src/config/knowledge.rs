use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Knowledge index
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Static JSON index loaded once at startup.
    #[serde(default = "d_index_path")]
    pub index_path: PathBuf,
    /// Matches kept per lookup when the model does not ask for a limit.
    #[serde(default = "d_default_limit")]
    pub default_limit: usize,
    /// Candidates scored before threshold filtering and truncation.
    #[serde(default = "d_candidate_limit")]
    pub candidate_limit: usize,
    #[serde(default = "d_minimum_score")]
    pub minimum_score: f64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            index_path: d_index_path(),
            default_limit: d_default_limit(),
            candidate_limit: d_candidate_limit(),
            minimum_score: d_minimum_score(),
        }
    }
}

fn d_index_path() -> PathBuf {
    PathBuf::from("./data/knowledge.json")
}
fn d_default_limit() -> usize {
    5
}
fn d_candidate_limit() -> usize {
    20
}
fn d_minimum_score() -> f64 {
    1.0
}
