use std::sync::Arc;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::llm_client::ChatModel;
use crate::sessions::SessionStore;
use crate::vector_store::VectorStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Default: OllamaEmbedder.
    pub embedder: Arc<dyn Embedder>,
    /// Qdrant or in-memory, chosen by VECTOR_BACKEND.
    pub store: Arc<dyn VectorStore>,
    /// Default: LlmClient against Ollama.
    pub llm: Arc<dyn ChatModel>,
    pub sessions: SessionStore,
}
