pub mod guide;
pub mod health;
pub mod knowledge;
pub mod sessions;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(health::health))
        // Guide turn
        .route("/v1/guide", post(guide::guide))
        // Sessions
        .route(
            "/v1/sessions/:id",
            get(sessions::get_session).delete(sessions::end_session),
        )
        .route("/v1/sessions/:id/stop", post(sessions::stop_session))
        .route("/v1/sessions/:id/history", get(sessions::get_history))
        .route("/v1/sessions/:id/notes", post(sessions::add_note))
        // Knowledge diagnostics
        .route("/v1/knowledge/search", get(knowledge::search))
}
