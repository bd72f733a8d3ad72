//! Batch ingestion of uploaded CVs.
//!
//! Files are processed sequentially. A file that fails at any stage is
//! reported and skipped; the rest of the batch still runs.

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::embedding::{check_dimensions, Embedder, EmbeddingError};
use crate::errors::AppError;
use crate::extraction::chunking::build_chunks;
use crate::extraction::{
    candidate_name_from_filename, extract_text, has_pdf_extension, ExtractionError,
};
use crate::models::cv::CvDocument;
use crate::vector_store::VectorStore;

#[derive(Debug, Clone)]
pub struct UploadedCv {
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Stored,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub filename: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    pub chunk_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub collection: String,
    pub stored: usize,
    pub failed: usize,
    pub outcomes: Vec<FileOutcome>,
    #[serde(skip)]
    pub documents: Vec<CvDocument>,
}

pub async fn process_batch(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    settings: ChunkSettings,
    files: Vec<UploadedCv>,
) -> Result<BatchReport, AppError> {
    if files.is_empty() {
        return Err(AppError::Validation(
            "Upload at least one PDF file".to_string(),
        ));
    }

    // A store that cannot even create the collection fails the whole action.
    store.ensure_collection(embedder.dimensions()).await?;

    let total = files.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut documents = Vec::new();

    for (idx, file) in files.into_iter().enumerate() {
        info!("Processing CV {}/{}: {}", idx + 1, total, file.filename);
        let filename = file.filename.clone();

        match ingest_file(embedder, store, settings, file).await {
            Ok(document) => {
                info!(
                    cv_id = %document.id,
                    chunks = document.chunk_count,
                    "Stored CV for {}",
                    document.candidate_name
                );
                outcomes.push(FileOutcome {
                    filename,
                    status: FileStatus::Stored,
                    cv_id: Some(document.id),
                    candidate_name: Some(document.candidate_name.clone()),
                    chunk_count: document.chunk_count,
                    error: None,
                });
                documents.push(document);
            }
            Err(e) => {
                warn!("Skipping {filename}: {e}");
                outcomes.push(FileOutcome {
                    filename,
                    status: FileStatus::Failed,
                    cv_id: None,
                    candidate_name: None,
                    chunk_count: 0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(BatchReport {
        collection: store.collection().to_string(),
        stored: documents.len(),
        failed: total - documents.len(),
        outcomes,
        documents,
    })
}

async fn ingest_file(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    settings: ChunkSettings,
    file: UploadedCv,
) -> Result<CvDocument, AppError> {
    if !has_pdf_extension(&file.filename) {
        return Err(ExtractionError::NotPdf.into());
    }

    let text = extract_text(file.bytes).await?;
    if text.is_empty() {
        return Err(ExtractionError::NoText.into());
    }

    let cv_id = Uuid::new_v4();
    let candidate_name = candidate_name_from_filename(&file.filename);
    let mut chunks = build_chunks(
        cv_id,
        &candidate_name,
        &file.filename,
        &text,
        settings.chunk_size,
        settings.chunk_overlap,
    );
    if chunks.is_empty() {
        return Err(ExtractionError::NoText.into());
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).await?;
    if vectors.len() != chunks.len() {
        return Err(EmbeddingError::MissingVectors {
            expected: chunks.len(),
            actual: vectors.len(),
        }
        .into());
    }
    check_dimensions(&vectors, embedder.dimensions())?;

    for (chunk, vector) in chunks.iter_mut().zip(vectors) {
        chunk.embedding = vector;
    }
    store.upsert(&chunks).await?;

    Ok(CvDocument {
        id: cv_id,
        filename: file.filename,
        candidate_name,
        char_count: text.chars().count(),
        chunk_count: chunks.len(),
        created_at: Utc::now(),
    })
}
