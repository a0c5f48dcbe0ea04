use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/health
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let llm = match &state.orchestrator {
        Some(o) => serde_json::json!({
            "ready": true,
            "provider": o.provider().provider_id(),
            "model": o.provider().default_model(),
        }),
        None => serde_json::json!({
            "ready": false,
            "error": state.llm_error,
        }),
    };

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "knowledge": {
            "entries": state.knowledge.len(),
            "version": state.knowledge.meta().version,
            "scope": state.knowledge.meta().scope,
        },
        "sessions": state.sessions.len(),
        "archivedSessions": state.archive.session_count(),
        "llm": llm,
        "webSearch": state.orchestrator.as_ref().is_some_and(|o| o.web_search_available()),
    }))
}
