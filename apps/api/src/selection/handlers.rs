use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::CandidateMatch;
use crate::selection::{select_candidates, summarize_selection, DEFAULT_TOP_N};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectCandidatesRequest {
    pub requirements: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub summarize: bool,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

#[derive(Debug, Serialize)]
pub struct SelectCandidatesResponse {
    pub requirements: String,
    pub top_n: usize,
    pub candidates: Vec<CandidateMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// POST /api/v1/sessions/:id/candidates
///
/// Replaces the session's selection. The interview transcript is reset
/// because it referred to the previous selection.
pub async fn handle_select_candidates(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectCandidatesRequest>,
) -> Result<Json<SelectCandidatesResponse>, AppError> {
    state.sessions.get(session_id).await?;

    let candidates = select_candidates(
        state.embedder.as_ref(),
        state.store.as_ref(),
        &request.requirements,
        request.top_n,
    )
    .await?;

    let summary = if request.summarize && !candidates.is_empty() {
        Some(summarize_selection(state.llm.as_ref(), &request.requirements, &candidates).await?)
    } else {
        None
    };

    let requirements = request.requirements.trim().to_string();
    state
        .sessions
        .set_selection(session_id, requirements.clone(), candidates.clone())
        .await?;

    Ok(Json(SelectCandidatesResponse {
        requirements,
        top_n: request.top_n,
        candidates,
        summary,
    }))
}
