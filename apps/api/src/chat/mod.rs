//! Chat orchestration for the two conversation modes.
//!
//! Interview questions are answered from the session's selected candidates.
//! Explorer questions retrieve their own context from the whole collection.
//! Either way the model sees one prompt built by [`prompts::build_prompt`].

pub mod handlers;
pub mod prompts;

use tracing::info;

use crate::embedding::Embedder;
use crate::errors::AppError;
use crate::llm_client::prompts::HR_ANALYST_SYSTEM;
use crate::llm_client::ChatModel;
use crate::models::cv::{CandidateMatch, ScoredChunk};
use crate::vector_store::VectorStore;

use self::prompts::{build_prompt, EXPLORER_QUERY_PREFIX};

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub answer: String,
    /// Candidate names whose text was in the prompt, deduplicated.
    pub context: Vec<String>,
}

/// Renders selected candidates as prompt context, one block per candidate.
pub fn candidate_context(candidates: &[CandidateMatch]) -> String {
    candidates
        .iter()
        .map(|c| {
            format!(
                "Candidate Name is {} ({}, similarity {:.3})\n\n{}",
                c.candidate_name,
                c.filename,
                c.score,
                c.excerpts.join("\n...\n")
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Renders retrieved chunks as prompt context. Chunk text already names
/// its candidate.
pub fn chunk_context(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

fn validate_question(question: &str) -> Result<&str, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }
    Ok(question)
}

fn unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for name in names {
        if !seen.iter().any(|n| n == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// Answers a question about the currently selected candidates.
pub async fn ask_interview(
    llm: &dyn ChatModel,
    candidates: &[CandidateMatch],
    question: &str,
) -> Result<ChatAnswer, AppError> {
    let question = validate_question(question)?;
    if candidates.is_empty() {
        return Err(AppError::Validation(
            "No candidates selected. Run candidate selection first.".to_string(),
        ));
    }

    let prompt = build_prompt(&candidate_context(candidates), question);
    let answer = llm.generate(HR_ANALYST_SYSTEM, &prompt).await?;

    info!(
        candidates = candidates.len(),
        model = llm.model(),
        "Interview question answered"
    );

    Ok(ChatAnswer {
        answer,
        context: unique_names(candidates.iter().map(|c| c.candidate_name.as_str())),
    })
}

/// Answers a question against the whole collection, using the top
/// `retrieval_k` chunks as context.
pub async fn ask_explorer(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    llm: &dyn ChatModel,
    question: &str,
    retrieval_k: usize,
) -> Result<ChatAnswer, AppError> {
    let question = validate_question(question)?;

    let query = format!("{EXPLORER_QUERY_PREFIX}{question}");
    let vector = embedder.embed(&query).await?;
    let hits = store.query(&vector, retrieval_k).await?;

    let prompt = build_prompt(&chunk_context(&hits), question);
    let answer = llm.generate(HR_ANALYST_SYSTEM, &prompt).await?;

    info!(
        chunks = hits.len(),
        model = llm.model(),
        "Explorer question answered"
    );

    Ok(ChatAnswer {
        answer,
        context: unique_names(hits.iter().map(|h| h.chunk.candidate_name.as_str())),
    })
}
