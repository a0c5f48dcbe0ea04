//! Session management endpoints: inspect, end, stop, history and notes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use tg_sessions::{is_valid_session_id, SessionNote};

use crate::runtime::turn::END_BY_CLIENT;
use crate::state::AppState;

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("session not found: {id}") })),
    )
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/sessions/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Snapshot of a live session. Reading does not refresh `lastSeenAt`.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Some(session) = state.sessions.peek(&id) else {
        return not_found(&id);
    };

    Json(serde_json::json!({
        "sessionId": session.id,
        "turns": session.turns(),
        "createdAt": session.created_at,
        "lastSeenAt": session.last_seen_at,
        "expiresAt": state.sessions.expires_at(&session),
        "expired": state.sessions.is_expired(&session),
        "lang": session.lang,
        "running": state.cancel_map.is_running(&id),
    }))
    .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DELETE /v1/sessions/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    state.cancel_map.cancel(&id);
    match state.sessions.end(&id, END_BY_CLIENT) {
        Some(session) => Json(serde_json::json!({
            "sessionId": session.id,
            "ended": true,
            "endReason": END_BY_CLIENT,
            "turns": session.turns(),
        }))
        .into_response(),
        None => not_found(&id),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/sessions/:id/stop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cancel the in-flight turn, if any. The turn answers with the
/// cancellation reply and leaves the session unchanged.
pub async fn stop_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let stopped = state.cancel_map.cancel(&id);
    Json(serde_json::json!({ "sessionId": id, "stopped": stopped }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/sessions/:id/history
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "d_history_limit")]
    pub limit: usize,
}

fn d_history_limit() -> usize {
    20
}

const MAX_HISTORY_LIMIT: usize = 100;

/// Archived exchanges, newest first. Works for ended sessions too.
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    let records = state.archive.recent(&id, q.limit.min(MAX_HISTORY_LIMIT));
    Json(serde_json::json!({
        "sessionId": id,
        "count": records.len(),
        "records": records,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/sessions/:id/notes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct NoteBody {
    pub text: String,
    /// e.g. `"image_analysis"`.
    #[serde(default)]
    pub kind: Option<String>,
}

/// Attach ancillary context (an image-analysis summary, say) that later
/// turns of this session see in their prompt.
pub async fn add_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NoteBody>,
) -> Response {
    if !is_valid_session_id(&id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid session id" })),
        )
            .into_response();
    }
    let text = body.text.trim();
    if text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "note text must be non-empty" })),
        )
            .into_response();
    }

    let note = SessionNote {
        kind: body.kind.unwrap_or_else(|| "note".into()),
        text: text.to_owned(),
        timestamp: state.sessions.now(),
    };
    match state.archive.add_note(&id, note).await {
        Ok(()) => Json(serde_json::json!({
            "sessionId": id,
            "notes": state.archive.notes(&id).len(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(session_id = %id, error = %e, "failed to store note");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "failed to store note" })),
            )
                .into_response()
        }
    }
}
