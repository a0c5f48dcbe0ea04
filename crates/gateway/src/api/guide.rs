//! The primary guide endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::runtime::turn::{run_guide_turn, GuideError, GuideRequest};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/guide
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Answer one visitor utterance.
///
/// Orchestrator outcomes (budget, guardrails, model failures) are always
/// a 200 with a speakable `reply`; only client-correctable input is a 400.
pub async fn guide(State(state): State<AppState>, Json(req): Json<GuideRequest>) -> Response {
    match run_guide_turn(&state, req).await {
        Ok(resp) => Json(resp).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: GuideError) -> Response {
    let code = err.code();
    match err {
        GuideError::EmptyInput => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": code,
                "message": "text or strippedText must be non-empty",
            })),
        )
            .into_response(),
        GuideError::WakeWordRequired(resp) | GuideError::EmptyQuestion(resp) => {
            (StatusCode::BAD_REQUEST, Json(*resp)).into_response()
        }
        GuideError::ModelUnavailable(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": code, "message": reason })),
        )
            .into_response(),
        GuideError::Busy => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": code })),
        )
            .into_response(),
    }
}
