use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and the backends this instance talks to.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "vector_backend": state.store.backend(),
        "collection": state.store.collection(),
        "embedding_model": state.embedder.model(),
        "llm_model": state.llm.model(),
    }))
}
