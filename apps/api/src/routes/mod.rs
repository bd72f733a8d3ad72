pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::cvs::handlers as cvs;
use crate::selection::handlers as selection;
use crate::sessions::handlers as sessions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/transcript/:mode",
            delete(sessions::handle_clear_transcript),
        )
        // CV ingestion
        .route(
            "/api/v1/sessions/:id/cvs",
            post(cvs::handle_upload_cvs).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/collection", delete(cvs::handle_delete_collection))
        // Selection and chat
        .route(
            "/api/v1/sessions/:id/candidates",
            post(selection::handle_select_candidates),
        )
        .route("/api/v1/sessions/:id/chat", post(chat::handle_interview_chat))
        .route("/api/v1/sessions/:id/explore", post(chat::handle_explore))
        .route("/api/v1/suggestions", get(chat::handle_suggestions))
        .with_state(state)
}
