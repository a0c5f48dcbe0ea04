use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Web search
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Live web search backend used when local knowledge is not confident
/// enough. Speaks the SearXNG JSON API (`GET {base_url}/search?format=json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_max_results")]
    pub max_results: usize,
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
    /// Response bodies larger than this are truncated before parsing.
    #[serde(default = "d_max_bytes")]
    pub max_bytes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: d_base_url(),
            max_results: d_max_results(),
            timeout_secs: d_timeout_secs(),
            max_bytes: d_max_bytes(),
        }
    }
}

fn d_base_url() -> String {
    "http://localhost:8888".into()
}
fn d_max_results() -> usize {
    5
}
fn d_timeout_secs() -> u64 {
    10
}
fn d_max_bytes() -> usize {
    512 * 1024
}
