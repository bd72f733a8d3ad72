//! Axum route handlers for interview chat, CV explorer and suggestions.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::prompts::{EXPLORER_SUGGESTIONS, INTERVIEW_SUGGESTIONS};
use crate::chat::{ask_explorer, ask_interview, ChatAnswer};
use crate::errors::AppError;
use crate::models::session::{ChatMode, ConversationTurn};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub mode: ChatMode,
    pub turn: ConversationTurn,
    pub transcript_len: usize,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub interview: &'static [&'static str],
    pub explorer: &'static [&'static str],
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/chat
///
/// Answers a question about the session's selected candidates.
pub async fn handle_interview_chat(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let answer = ask_interview(
        state.llm.as_ref(),
        &session.selected_candidates,
        &request.question,
    )
    .await?;

    record_turn(&state, session_id, ChatMode::Interview, &request.question, answer).await
}

/// POST /api/v1/sessions/:id/explore
///
/// Answers a question from the whole CV collection.
pub async fn handle_explore(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    state.sessions.get(session_id).await?;
    let answer = ask_explorer(
        state.embedder.as_ref(),
        state.store.as_ref(),
        state.llm.as_ref(),
        &request.question,
        state.config.retrieval_k,
    )
    .await?;

    record_turn(&state, session_id, ChatMode::Explorer, &request.question, answer).await
}

/// GET /api/v1/suggestions
pub async fn handle_suggestions() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        interview: INTERVIEW_SUGGESTIONS,
        explorer: EXPLORER_SUGGESTIONS,
    })
}

async fn record_turn(
    state: &AppState,
    session_id: Uuid,
    mode: ChatMode,
    question: &str,
    answer: ChatAnswer,
) -> Result<Json<ChatResponse>, AppError> {
    let turn = ConversationTurn {
        question: question.trim().to_string(),
        answer: answer.answer,
        context: answer.context,
        asked_at: Utc::now(),
    };
    state
        .sessions
        .append_turn(session_id, mode, turn.clone())
        .await?;
    let transcript_len = state
        .sessions
        .get(session_id)
        .await?
        .transcript(mode)
        .len();

    Ok(Json(ChatResponse {
        mode,
        turn,
        transcript_len,
    }))
}
