use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which vector database implementation backs the CV collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    Qdrant,
    /// Process-local store. Contents are lost on restart.
    Memory,
}

impl FromStr for VectorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(VectorBackend::Qdrant),
            "memory" | "in-memory" | "inmemory" => Ok(VectorBackend::Memory),
            other => bail!("unknown vector backend '{other}' (expected 'qdrant' or 'memory')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every value has a default; malformed values abort startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub vector_backend: VectorBackend,
    pub qdrant_url: String,
    pub collection_name: String,
    pub ollama_url: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Number of chunks retrieved as context for explorer questions.
    pub retrieval_k: usize,
    pub max_upload_mb: usize,
    /// Sessions untouched for this many minutes are dropped. 0 keeps them
    /// until deleted.
    pub session_idle_mins: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config = Config {
            port: parse_var(&lookup, "PORT", 8080)?,
            rust_log: text("RUST_LOG", "info"),
            vector_backend: parse_var(&lookup, "VECTOR_BACKEND", VectorBackend::Qdrant)?,
            qdrant_url: text("QDRANT_URL", "http://localhost:6334"),
            collection_name: text("COLLECTION_NAME", "vector_db"),
            ollama_url: text("OLLAMA_URL", "http://localhost:11434")
                .trim_end_matches('/')
                .to_string(),
            embedding_model: text("EMBEDDING_MODEL", "nomic-embed-text"),
            embedding_dim: parse_var(&lookup, "EMBEDDING_DIM", 768)?,
            llm_model: text("LLM_MODEL", "llama3.2:3b"),
            llm_temperature: parse_var(&lookup, "LLM_TEMPERATURE", 0.7)?,
            llm_timeout_secs: parse_var(&lookup, "LLM_TIMEOUT_SECS", 120)?,
            chunk_size: parse_var(&lookup, "CHUNK_SIZE", 1000)?,
            chunk_overlap: parse_var(&lookup, "CHUNK_OVERLAP", 250)?,
            retrieval_k: parse_var(&lookup, "RETRIEVAL_K", 5)?,
            max_upload_mb: parse_var(&lookup, "MAX_UPLOAD_MB", 25)?,
            session_idle_mins: parse_var(&lookup, "SESSION_IDLE_MINS", 120)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            bail!("EMBEDDING_DIM must be greater than zero");
        }
        if self.chunk_size == 0 {
            bail!("CHUNK_SIZE must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if self.retrieval_k == 0 {
            bail!("RETRIEVAL_K must be greater than zero");
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            bail!("LLM_TEMPERATURE must be between 0.0 and 2.0");
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(raw) if !raw.is_empty() => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        _ => Ok(default),
    }
}
