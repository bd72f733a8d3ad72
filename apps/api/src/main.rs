mod chat;
mod config;
mod cvs;
mod embedding;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod selection;
mod sessions;
mod state;
#[cfg(test)]
mod testing;
mod vector_store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, VectorBackend};
use crate::embedding::OllamaEmbedder;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::sessions::SessionStore;
use crate::state::AppState;
use crate::vector_store::{InMemoryVectorStore, QdrantVectorStore, VectorStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (malformed values abort startup)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Assistant API v{}", env!("CARGO_PKG_VERSION"));

    // One HTTP client for every Ollama call; the timeout bounds each request.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.llm_timeout_secs))
        .build()?;

    let store: Arc<dyn VectorStore> = match config.vector_backend {
        VectorBackend::Qdrant => {
            info!("Vector store: qdrant at {}", config.qdrant_url);
            Arc::new(QdrantVectorStore::new(&config.qdrant_url, &config.collection_name)?)
        }
        VectorBackend::Memory => {
            info!("Vector store: in-memory (contents are lost on restart)");
            Arc::new(InMemoryVectorStore::new(&config.collection_name))
        }
    };

    let embedder = OllamaEmbedder::new(
        http.clone(),
        &config.ollama_url,
        &config.embedding_model,
        config.embedding_dim,
    );
    info!(
        "Embedding client initialized (model: {}, dim: {})",
        config.embedding_model, config.embedding_dim
    );

    let llm = LlmClient::new(
        http,
        &config.ollama_url,
        &config.llm_model,
        config.llm_temperature,
    );
    info!("LLM client initialized (model: {})", config.llm_model);

    let sessions = SessionStore::new();
    if config.session_idle_mins > 0 {
        sessions.spawn_idle_eviction(
            chrono::Duration::minutes(i64::from(config.session_idle_mins)),
            Duration::from_secs(60),
        );
        info!("Idle sessions expire after {} minutes", config.session_idle_mins);
    }

    // Build app state
    let state = AppState {
        embedder: Arc::new(embedder),
        store,
        llm: Arc::new(llm),
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
