use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A CV that has been extracted, chunked, and embedded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CvDocument {
    pub id: Uuid,
    pub filename: String,
    pub candidate_name: String,
    pub char_count: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

/// One embedded slice of a CV. `id` is the vector database point id; the
/// remaining fields except `embedding` travel as the point payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CvChunk {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub candidate_name: String,
    pub filename: String,
    pub chunk_index: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

/// A chunk returned from a similarity query. Embeddings are not returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: CvChunk,
    /// Cosine similarity, higher is more similar.
    pub score: f32,
}

/// A CV ranked against a job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub cv_id: Uuid,
    pub candidate_name: String,
    pub filename: String,
    /// Best chunk score for this CV.
    pub score: f32,
    /// Matched chunk texts in document order.
    pub excerpts: Vec<String>,
}
