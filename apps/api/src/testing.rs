//! Deterministic fakes shared by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::Config;
use crate::embedding::{EmbeddingError, Embedder};
use crate::llm_client::{ChatModel, LlmError};
use crate::sessions::SessionStore;
use crate::state::AppState;
use crate::vector_store::InMemoryVectorStore;

pub const TEST_DIMENSIONS: usize = 1024;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Bag-of-words embedder: each lowercase token is hashed (FNV-1a) into one
/// of `dimensions` buckets. Texts sharing words land close together.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in token.to_lowercase().bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            vector[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        "hash"
    }
}

/// Chat model that replies with a fixed answer and records every prompt.
pub struct ScriptedChat {
    reply: String,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedChat {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .map(|(_, prompt)| prompt.clone())
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        if self.reply.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(self.reply.clone())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Default config wired to the in-memory store, the hash embedder and a
/// chat model that always answers `reply`.
pub fn test_state(reply: &str) -> AppState {
    let config = Config::from_lookup(|key| match key {
        "VECTOR_BACKEND" => Some("memory".to_string()),
        "EMBEDDING_DIM" => Some(TEST_DIMENSIONS.to_string()),
        _ => None,
    })
    .unwrap();

    AppState {
        store: Arc::new(InMemoryVectorStore::new(&config.collection_name)),
        embedder: Arc::new(HashEmbedder::new(config.embedding_dim)),
        llm: Arc::new(ScriptedChat::new(reply)),
        sessions: SessionStore::new(),
        config,
    }
}
