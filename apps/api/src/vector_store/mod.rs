//! Vector store adapter over the CV collection.
//!
//! The store owns one named collection. Ranking, durability and indexing
//! belong to the backend; this layer only maps CV chunks to points and back.

pub mod memory;
pub mod qdrant;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::cv::{CvChunk, ScoredChunk};

pub use memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{0}' does not exist")]
    MissingCollection(String),

    #[error("vector has {actual} dimensions, collection expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("chunk {0} has no embedding")]
    MissingEmbedding(uuid::Uuid),

    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },
}

/// Storage backend for CV chunk embeddings.
///
/// Carried in `AppState` as `Arc<dyn VectorStore>`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    fn collection(&self) -> &str;

    /// Creates the collection when missing. Fails with `DimensionMismatch`
    /// if it exists with a different vector size.
    async fn ensure_collection(&self, dimensions: usize) -> Result<(), StoreError>;

    /// Inserts or replaces chunks by id. Every chunk must carry its embedding.
    async fn upsert(&self, chunks: &[CvChunk]) -> Result<(), StoreError>;

    /// Returns up to `top_k` chunks ordered by descending similarity.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, StoreError>;

    /// Number of stored points; zero when the collection does not exist.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Drops the collection. Returns `false` if there was nothing to drop.
    async fn delete_collection(&self) -> Result<bool, StoreError>;
}

/// Rejects chunks whose embedding is absent or of the wrong length.
pub(crate) fn check_chunks(chunks: &[CvChunk], dimensions: usize) -> Result<(), StoreError> {
    for chunk in chunks {
        if chunk.embedding.is_empty() {
            return Err(StoreError::MissingEmbedding(chunk.id));
        }
        if chunk.embedding.len() != dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: dimensions,
                actual: chunk.embedding.len(),
            });
        }
    }
    Ok(())
}
