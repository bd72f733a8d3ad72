//! Embedding client. Turns CV chunks and job descriptions into vectors.
//!
//! All embedding calls go through the [`Embedder`] trait; the production
//! implementation talks to Ollama's `/api/embed` endpoint. Calls are single
//! shot: failures are surfaced to the caller, never retried here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Ollama accepts batched input; larger batches risk request timeouts on CPU.
const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("expected {expected} embeddings, received {actual}")]
    MissingVectors { expected: usize, actual: usize },

    #[error("embedding has {actual} dimensions, collection expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("cannot embed empty text")]
    EmptyInput,
}

/// A provider that turns text into fixed-length vectors.
///
/// Carried in `AppState` as `Arc<dyn Embedder>`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Length of every vector this provider returns.
    fn dimensions(&self) -> usize;

    /// Model identifier, reported by the health endpoint.
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::MissingVectors {
                expected: 1,
                actual: vectors.len(),
            });
        }
        Ok(vectors.into_iter().next().unwrap_or_default())
    }
}

/// Checks every vector against the configured dimension.
pub fn check_dimensions(vectors: &[Vec<f32>], expected: usize) -> Result<(), EmbeddingError> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(bad) => Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: bad.len(),
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OllamaErrorBody {
    pub error: String,
}

/// Embedder backed by a local Ollama server.
#[derive(Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(client: Client, base_url: &str, model: &str, dimensions: usize) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let mut all = Vec::with_capacity(texts.len());

        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            let response = self
                .client
                .post(&url)
                .json(&OllamaEmbedRequest {
                    model: &self.model,
                    input: batch,
                })
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<OllamaErrorBody>(&body)
                    .map(|e| e.error)
                    .unwrap_or(body);
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body: OllamaEmbedResponse = response.json().await?;
            if body.embeddings.len() != batch.len() {
                return Err(EmbeddingError::MissingVectors {
                    expected: batch.len(),
                    actual: body.embeddings.len(),
                });
            }
            check_dimensions(&body.embeddings, self.dimensions)?;
            all.extend(body.embeddings);
        }

        debug!(model = %self.model, count = all.len(), "embedded texts");
        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}
