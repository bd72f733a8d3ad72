//! Axum route handlers for CV upload and collection management.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::cvs::ingest::{process_batch, BatchReport, ChunkSettings, UploadedCv};
use crate::errors::AppError;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Serialize)]
pub struct DeleteCollectionResponse {
    pub collection: String,
    pub deleted: bool,
}

/// POST /api/v1/sessions/:id/cvs
///
/// Accepts a multipart body with one or more PDF parts in the `files`
/// field. Other fields are ignored; the report has one outcome per file in
/// upload order.
pub async fn handle_upload_cvs(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<BatchReport>, AppError> {
    state.sessions.get(session_id).await?;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(invalid_multipart)?;
        files.push(UploadedCv { filename, bytes });
    }

    let settings = ChunkSettings {
        chunk_size: state.config.chunk_size,
        chunk_overlap: state.config.chunk_overlap,
    };
    let report = process_batch(
        state.embedder.as_ref(),
        state.store.as_ref(),
        settings,
        files,
    )
    .await?;

    info!(
        %session_id,
        stored = report.stored,
        failed = report.failed,
        "CV batch processed"
    );
    state
        .sessions
        .add_documents(session_id, report.documents.clone())
        .await?;

    Ok(Json(report))
}

/// DELETE /api/v1/collection
///
/// Drops the whole CV collection. Deleting a collection that does not exist
/// is not an error; `deleted` is false in that case.
pub async fn handle_delete_collection(
    State(state): State<AppState>,
) -> Result<Json<DeleteCollectionResponse>, AppError> {
    let deleted = state.store.delete_collection().await?;
    state.sessions.forget_documents().await;

    if deleted {
        info!(collection = state.store.collection(), "CV collection deleted");
    }

    Ok(Json(DeleteCollectionResponse {
        collection: state.store.collection().to_string(),
        deleted,
    }))
}

fn invalid_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}
