use serde::Serialize;

/// Structured trace events emitted across all tour-guide crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionResolved {
        session_id: String,
        is_new: bool,
    },
    SessionExpired {
        session_id: String,
        idle_ms: i64,
    },
    SessionEnded {
        session_id: String,
        reason: String,
        turns: u32,
    },
    ArchiveAppend {
        session_id: String,
        records: usize,
    },
    KnowledgeLookup {
        query: String,
        limit: usize,
        minimum_score: f64,
        matches: usize,
        best_score: Option<f64>,
    },
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    WebSearch {
        query: String,
        results: usize,
        duration_ms: u64,
    },
    AgentRunCompleted {
        prefer_web_search: bool,
        reasoning_turns: u32,
        lookups: usize,
        used_web_search: bool,
        total_tokens: u64,
    },
    Escalation {
        reason: String,
    },
    GuardrailTripped {
        guardrail: String,
        detail: String,
    },
    BudgetExceeded {
        total_tokens: u64,
        requests: u32,
        max_total_tokens: u64,
        max_requests: u32,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "tg_event");
    }
}
