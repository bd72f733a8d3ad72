use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::{ChatMode, Session};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionStatusResponse {
    #[serde(flatten)]
    pub session: Session,
    pub cvs_loaded: bool,
    /// True once the shared collection holds at least one chunk.
    pub ai_ready: bool,
    pub stored_chunks: u64,
}

#[derive(Serialize)]
pub struct ClearTranscriptResponse {
    pub mode: ChatMode,
    pub cleared: usize,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<Session>) {
    let session = state.sessions.create().await;
    (StatusCode::CREATED, Json(session))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let session = state.sessions.get(session_id).await?;

    // An unreachable store reports "not ready" instead of failing the page.
    let stored_chunks = match state.store.count().await {
        Ok(count) => count,
        Err(e) => {
            warn!("Could not count stored chunks: {e}");
            0
        }
    };

    Ok(Json(SessionStatusResponse {
        cvs_loaded: !session.documents.is_empty(),
        ai_ready: stored_chunks > 0,
        stored_chunks,
        session,
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(session_id).await?;
    info!(%session_id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/sessions/:id/transcript/:mode
pub async fn handle_clear_transcript(
    State(state): State<AppState>,
    Path((session_id, mode)): Path<(Uuid, ChatMode)>,
) -> Result<Json<ClearTranscriptResponse>, AppError> {
    let cleared = state.sessions.clear_transcript(session_id, mode).await?;
    Ok(Json(ClearTranscriptResponse { mode, cleared }))
}
