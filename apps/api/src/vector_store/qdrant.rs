//! Qdrant backend for the CV collection, via `qdrant-client` over gRPC.
//!
//! Points use cosine distance. The payload carries everything needed to
//! rebuild a [`CvChunk`] except the embedding.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, GetCollectionInfoRequest, PointId,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::cv::{CvChunk, ScoredChunk};
use crate::vector_store::{check_chunks, StoreError, VectorStore};

const BACKEND: &str = "qdrant";

pub struct QdrantVectorStore {
    client: Qdrant,
    name: String,
}

impl QdrantVectorStore {
    /// Builds a client for `url` (the gRPC port, 6334 by default). No
    /// connection is made until the first request.
    pub fn new(url: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Qdrant::from_url(url).build().map_err(map_err)?;
        Ok(Self {
            client,
            name: collection.to_string(),
        })
    }

    async fn exists(&self) -> Result<bool, StoreError> {
        let collections = self.client.list_collections().await.map_err(map_err)?;
        Ok(collections.collections.iter().any(|c| c.name == self.name))
    }

    async fn configured_dimensions(&self) -> Result<Option<usize>, StoreError> {
        let info = self
            .client
            .collection_info(GetCollectionInfoRequest {
                collection_name: self.name.clone(),
            })
            .await
            .map_err(map_err)?;

        Ok(info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|config| match config {
                VectorsConfigKind::Params(params) => Some(params.size as usize),
                VectorsConfigKind::ParamsMap(_) => None,
            }))
    }
}

fn map_err(e: qdrant_client::QdrantError) -> StoreError {
    StoreError::Backend {
        backend: BACKEND,
        message: e.to_string(),
    }
}

fn to_point(chunk: &CvChunk) -> Result<PointStruct, StoreError> {
    let payload = Payload::try_from(json!({
        "cv_id": chunk.cv_id.to_string(),
        "candidate_name": chunk.candidate_name,
        "filename": chunk.filename,
        "chunk_index": chunk.chunk_index,
        "text": chunk.text,
    }))
    .map_err(|e| StoreError::Backend {
        backend: BACKEND,
        message: format!("invalid payload: {e}"),
    })?;

    Ok(PointStruct::new(
        chunk.id.to_string(),
        chunk.embedding.clone(),
        payload,
    ))
}

fn extract_string(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<String> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn extract_index(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<u32> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::IntegerValue(n)) => u32::try_from(*n).ok(),
        Some(Kind::DoubleValue(n)) if *n >= 0.0 => Some(*n as u32),
        _ => None,
    }
}

fn point_uuid(id: Option<&PointId>) -> Option<Uuid> {
    match id.and_then(|pid| pid.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(s)) => Uuid::parse_str(s).ok(),
        _ => None,
    }
}

/// Rebuilds a scored chunk from a Qdrant hit. Points without a parseable
/// `cv_id` were not written by this service and are rejected.
fn scored_chunk(
    id: Option<&PointId>,
    payload: &HashMap<String, QdrantValue>,
    score: f32,
) -> Result<ScoredChunk, StoreError> {
    let malformed = |field: &str| StoreError::Backend {
        backend: BACKEND,
        message: format!("point payload is missing a valid '{field}'"),
    };

    let id = point_uuid(id).ok_or_else(|| malformed("id"))?;
    let cv_id = extract_string(payload, "cv_id")
        .and_then(|s| Uuid::parse_str(&s).ok())
        .ok_or_else(|| malformed("cv_id"))?;

    Ok(ScoredChunk {
        chunk: CvChunk {
            id,
            cv_id,
            candidate_name: extract_string(payload, "candidate_name").unwrap_or_default(),
            filename: extract_string(payload, "filename").unwrap_or_default(),
            chunk_index: extract_index(payload, "chunk_index").unwrap_or_default(),
            text: extract_string(payload, "text").unwrap_or_default(),
            embedding: Vec::new(),
        },
        score,
    })
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn collection(&self) -> &str {
        &self.name
    }

    async fn ensure_collection(&self, dimensions: usize) -> Result<(), StoreError> {
        if self.exists().await? {
            if let Some(existing) = self.configured_dimensions().await? {
                if existing != dimensions {
                    return Err(StoreError::DimensionMismatch {
                        expected: existing,
                        actual: dimensions,
                    });
                }
            }
            debug!(collection = %self.name, "qdrant collection already exists");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(self.name.as_str())
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(map_err)?;

        info!(collection = %self.name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn upsert(&self, chunks: &[CvChunk]) -> Result<(), StoreError> {
        if chunks.is_empty() {
            return Ok(());
        }
        if let Some(dimensions) = chunks.first().map(|c| c.embedding.len()) {
            check_chunks(chunks, dimensions)?;
        }

        let points = chunks.iter().map(to_point).collect::<Result<Vec<_>, _>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(self.name.as_str(), points).wait(true))
            .await
            .map_err(map_err)?;

        debug!(collection = %self.name, count = chunks.len(), "upserted chunks to qdrant");
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        if !self.exists().await? {
            return Err(StoreError::MissingCollection(self.name.clone()));
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(self.name.as_str(), vector.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(map_err)?;

        response
            .result
            .iter()
            .map(|hit| scored_chunk(hit.id.as_ref(), &hit.payload, hit.score))
            .collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        if !self.exists().await? {
            return Ok(0);
        }
        let response = self
            .client
            .count(CountPointsBuilder::new(self.name.as_str()).exact(true))
            .await
            .map_err(map_err)?;
        Ok(response.result.map_or(0, |r| r.count))
    }

    async fn delete_collection(&self) -> Result<bool, StoreError> {
        if !self.exists().await? {
            return Ok(false);
        }
        self.client
            .delete_collection(self.name.as_str())
            .await
            .map_err(map_err)?;
        info!(collection = %self.name, "deleted qdrant collection");
        Ok(true)
    }
}
