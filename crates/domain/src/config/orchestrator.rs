use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dialogue orchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hard ceiling on model round-trips within one agent run.
    #[serde(default = "d_max_agent_turns")]
    pub max_agent_turns: u32,
    /// Input guardrail: serialized prompt length ceiling, in characters.
    #[serde(default = "d_max_input_chars")]
    pub max_input_chars: usize,
    /// Best knowledge score below which a run escalates to web search.
    #[serde(default = "d_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default)]
    pub budget: BudgetConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_agent_turns: d_max_agent_turns(),
            max_input_chars: d_max_input_chars(),
            confidence_threshold: d_confidence_threshold(),
            budget: BudgetConfig::default(),
        }
    }
}

/// Per-turn cost ceilings, summed across the primary and fallback runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "d_max_total_tokens")]
    pub max_total_tokens: u64,
    #[serde(default = "d_max_requests")]
    pub max_requests: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_total_tokens: d_max_total_tokens(),
            max_requests: d_max_requests(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_max_agent_turns() -> u32 {
    12
}
fn d_max_input_chars() -> usize {
    6_000
}
fn d_confidence_threshold() -> f64 {
    5.0
}
fn d_max_total_tokens() -> u64 {
    16_000
}
fn d_max_requests() -> u32 {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_section_overrides_nested() {
        let toml_str = r#"
            confidence_threshold = 7.5

            [budget]
            max_total_tokens = 4000
        "#;
        let cfg: OrchestratorConfig = toml::from_str(toml_str).unwrap();
        assert!((cfg.confidence_threshold - 7.5).abs() < f64::EPSILON);
        assert_eq!(cfg.budget.max_total_tokens, 4000);
        assert_eq!(cfg.budget.max_requests, 16);
        assert_eq!(cfg.max_agent_turns, 12);
    }
}
