//! Knowledge scorer diagnostics.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/knowledge/search?q=&limit=&min_score=
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
    pub min_score: Option<f64>,
}

/// Run the scorer exactly as the `knowledge_search` tool would.
pub async fn search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Response {
    let query = q.q.trim();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "q must be non-empty" })),
        )
            .into_response();
    }

    let cfg = &state.config.knowledge;
    let limit = q
        .limit
        .unwrap_or(cfg.default_limit)
        .clamp(1, cfg.candidate_limit.max(1));
    let min_score = q.min_score.unwrap_or(0.0).max(0.0);
    let matches = state.knowledge.search_filtered(query, limit, min_score);

    Json(serde_json::json!({
        "query": query,
        "limit": limit,
        "minScore": min_score,
        "count": matches.len(),
        "matches": matches,
    }))
    .into_response()
}
