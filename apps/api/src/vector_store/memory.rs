//! Process-local vector store using cosine similarity.
//!
//! Backs `VECTOR_BACKEND=memory` and the test suite. Contents live behind a
//! `tokio::sync::RwLock` and vanish on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::cv::{CvChunk, ScoredChunk};
use crate::vector_store::{check_chunks, StoreError, VectorStore};

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    /// Insertion order is kept so equal scores come back in a stable order.
    order: Vec<Uuid>,
    points: HashMap<Uuid, CvChunk>,
}

#[derive(Debug)]
pub struct InMemoryVectorStore {
    name: String,
    collection: RwLock<Option<Collection>>,
}

impl InMemoryVectorStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: RwLock::new(None),
        }
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn collection(&self) -> &str {
        &self.name
    }

    async fn ensure_collection(&self, dimensions: usize) -> Result<(), StoreError> {
        let mut guard = self.collection.write().await;
        match guard.as_ref() {
            Some(existing) if existing.dimensions != dimensions => {
                Err(StoreError::DimensionMismatch {
                    expected: existing.dimensions,
                    actual: dimensions,
                })
            }
            Some(_) => Ok(()),
            None => {
                *guard = Some(Collection {
                    dimensions,
                    order: Vec::new(),
                    points: HashMap::new(),
                });
                Ok(())
            }
        }
    }

    async fn upsert(&self, chunks: &[CvChunk]) -> Result<(), StoreError> {
        let mut guard = self.collection.write().await;
        let collection = guard
            .as_mut()
            .ok_or_else(|| StoreError::MissingCollection(self.name.clone()))?;
        check_chunks(chunks, collection.dimensions)?;

        for chunk in chunks {
            if collection.points.insert(chunk.id, chunk.clone()).is_none() {
                collection.order.push(chunk.id);
            }
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        let guard = self.collection.read().await;
        let collection = guard
            .as_ref()
            .ok_or_else(|| StoreError::MissingCollection(self.name.clone()))?;
        if vector.len() != collection.dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: collection.dimensions,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = collection
            .order
            .iter()
            .filter_map(|id| collection.points.get(id))
            .map(|chunk| ScoredChunk {
                score: cosine_similarity(&chunk.embedding, vector),
                chunk: CvChunk {
                    embedding: Vec::new(),
                    ..chunk.clone()
                },
            })
            .collect();

        // sort_by is stable: ties keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let guard = self.collection.read().await;
        Ok(guard.as_ref().map_or(0, |c| c.points.len() as u64))
    }

    async fn delete_collection(&self) -> Result<bool, StoreError> {
        let mut guard = self.collection.write().await;
        Ok(guard.take().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(cv_id: Uuid, index: u32, embedding: Vec<f32>) -> CvChunk {
        CvChunk {
            id: Uuid::new_v4(),
            cv_id,
            candidate_name: "Jane Doe".to_string(),
            filename: "Jane_Doe.pdf".to_string(),
            chunk_index: index,
            text: format!("chunk {index}"),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_self_query_returns_upserted_point_first() {
        let store = InMemoryVectorStore::new("cvs");
        store.ensure_collection(3).await.unwrap();
        let cv = Uuid::new_v4();
        let target = chunk(cv, 0, vec![0.2, 0.9, 0.1]);
        let others = vec![
            chunk(cv, 1, vec![1.0, 0.0, 0.0]),
            chunk(cv, 2, vec![0.0, 0.0, 1.0]),
        ];
        store.upsert(&others).await.unwrap();
        store.upsert(std::slice::from_ref(&target)).await.unwrap();

        let hits = store.query(&target.embedding, 3).await.unwrap();
        assert_eq!(hits[0].chunk.id, target.id);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits[0].chunk.embedding.is_empty());
    }

    #[tokio::test]
    async fn test_results_are_ordered_and_truncated() {
        let store = InMemoryVectorStore::new("cvs");
        store.ensure_collection(2).await.unwrap();
        let cv = Uuid::new_v4();
        store
            .upsert(&[
                chunk(cv, 0, vec![1.0, 0.0]),
                chunk(cv, 1, vec![0.7, 0.7]),
                chunk(cv, 2, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store.query(&[1.0, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
        assert_eq!(hits[0].chunk.chunk_index, 0);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_id() {
        let store = InMemoryVectorStore::new("cvs");
        store.ensure_collection(2).await.unwrap();
        let mut point = chunk(Uuid::new_v4(), 0, vec![1.0, 0.0]);
        store.upsert(std::slice::from_ref(&point)).await.unwrap();
        point.text = "updated".to_string();
        store.upsert(std::slice::from_ref(&point)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.query(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits[0].chunk.text, "updated");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let store = InMemoryVectorStore::new("cvs");
        store.ensure_collection(3).await.unwrap();
        let err = store
            .upsert(&[chunk(Uuid::new_v4(), 0, vec![1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(store.query(&[1.0], 1).await.is_err());
        assert!(store.ensure_collection(4).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let store = InMemoryVectorStore::new("cvs");
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(matches!(
            store.query(&[1.0], 1).await,
            Err(StoreError::MissingCollection(_))
        ));
        assert!(!store.delete_collection().await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_then_recreate() {
        let store = InMemoryVectorStore::new("cvs");
        store.ensure_collection(2).await.unwrap();
        store
            .upsert(&[chunk(Uuid::new_v4(), 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        assert!(store.delete_collection().await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);

        store.ensure_collection(4).await.unwrap();
        let hits = store.query(&[0.0, 0.0, 0.0, 1.0], 1).await.unwrap();
        assert!(hits.is_empty());
    }
}
