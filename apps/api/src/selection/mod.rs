//! Candidate selection: embed the job requirements, pull the nearest CV
//! chunks and collapse them into one match per CV.
//!
//! The store ranks chunks, not CVs, so a single long CV can fill the whole
//! first page. When that happens the query limit doubles until `top_n`
//! distinct CVs are found or the store has nothing more to give.

pub mod handlers;

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::candidate_context;
use crate::chat::prompts::build_prompt;
use crate::embedding::Embedder;
use crate::errors::AppError;
use crate::llm_client::prompts::HR_ANALYST_SYSTEM;
use crate::llm_client::{ChatModel, LlmError};
use crate::models::cv::{CandidateMatch, ScoredChunk};
use crate::vector_store::VectorStore;

pub const MAX_TOP_N: usize = 50;
pub const DEFAULT_TOP_N: usize = 3;
const OVERSAMPLE: usize = 4;
const MAX_EXCERPTS: usize = 3;

/// Returns at most `top_n` candidates ordered by their best chunk score.
pub async fn select_candidates(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    requirements: &str,
    top_n: usize,
) -> Result<Vec<CandidateMatch>, AppError> {
    let requirements = requirements.trim();
    if requirements.is_empty() {
        return Err(AppError::Validation(
            "Job requirements cannot be empty".to_string(),
        ));
    }
    if top_n == 0 || top_n > MAX_TOP_N {
        return Err(AppError::Validation(format!(
            "top_n must be between 1 and {MAX_TOP_N}"
        )));
    }

    let vector = embedder.embed(requirements).await?;

    let mut limit = top_n * OVERSAMPLE;
    loop {
        let hits = store.query(&vector, limit).await?;
        let exhausted = hits.len() < limit;
        let candidates = group_by_cv(hits, top_n);

        if candidates.len() >= top_n || exhausted {
            info!(
                requested = top_n,
                found = candidates.len(),
                "Candidate selection complete"
            );
            return Ok(candidates);
        }

        debug!(limit, found = candidates.len(), "Widening candidate search");
        limit *= 2;
    }
}

/// Collapses score-ordered chunk hits into per-CV matches. The first hit
/// seen for a CV sets its score; the best `MAX_EXCERPTS` hits become its
/// excerpts, reported in document order.
pub fn group_by_cv(hits: Vec<ScoredChunk>, top_n: usize) -> Vec<CandidateMatch> {
    let mut matches: Vec<(CandidateMatch, Vec<u32>)> = Vec::new();
    let mut positions: HashMap<Uuid, usize> = HashMap::new();

    for hit in hits {
        let excerpt = excerpt(&hit);
        let index = hit.chunk.chunk_index;
        match positions.get(&hit.chunk.cv_id) {
            Some(&pos) => {
                let (existing, indices) = &mut matches[pos];
                if existing.excerpts.len() < MAX_EXCERPTS {
                    existing.excerpts.push(excerpt);
                    indices.push(index);
                }
            }
            None if matches.len() < top_n => {
                positions.insert(hit.chunk.cv_id, matches.len());
                matches.push((
                    CandidateMatch {
                        cv_id: hit.chunk.cv_id,
                        candidate_name: hit.chunk.candidate_name,
                        filename: hit.chunk.filename,
                        score: hit.score,
                        excerpts: vec![excerpt],
                    },
                    vec![index],
                ));
            }
            None => {}
        }
    }

    matches
        .into_iter()
        .map(|(mut candidate, indices)| {
            let mut ordered: Vec<(u32, String)> =
                indices.into_iter().zip(candidate.excerpts).collect();
            ordered.sort_by_key(|(index, _)| *index);
            candidate.excerpts = ordered.into_iter().map(|(_, text)| text).collect();
            candidate
        })
        .collect()
}

/// Chunk text without the name prefix added at ingest time.
fn excerpt(hit: &ScoredChunk) -> String {
    let prefix = format!("Candidate Name is {}\n\n", hit.chunk.candidate_name);
    hit.chunk
        .text
        .strip_prefix(&prefix)
        .unwrap_or(&hit.chunk.text)
        .to_string()
}

/// Asks the model to rank and justify an existing selection.
pub async fn summarize_selection(
    llm: &dyn ChatModel,
    requirements: &str,
    candidates: &[CandidateMatch],
) -> Result<String, LlmError> {
    let question = format!(
        "Select the top {} candidates based on the following requirements: {}",
        candidates.len(),
        requirements.trim()
    );
    let prompt = build_prompt(&candidate_context(candidates), &question);
    llm.generate(HR_ANALYST_SYSTEM, &prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::CvChunk;
    use crate::testing::{HashEmbedder, ScriptedChat};
    use crate::vector_store::InMemoryVectorStore;

    struct Cv {
        id: Uuid,
        name: &'static str,
    }

    fn chunk(embedder: &HashEmbedder, cv: &Cv, index: u32, body: &str) -> CvChunk {
        let text = format!("Candidate Name is {}\n\n{body}", cv.name);
        CvChunk {
            id: Uuid::new_v4(),
            cv_id: cv.id,
            candidate_name: cv.name.to_string(),
            filename: format!("{}.pdf", cv.name),
            chunk_index: index,
            embedding: embedder.vector(&text),
            text,
        }
    }

    async fn store_with(embedder: &HashEmbedder, chunks: Vec<CvChunk>) -> InMemoryVectorStore {
        let store = InMemoryVectorStore::new("cvs");
        store.ensure_collection(embedder.dimensions()).await.unwrap();
        store.upsert(&chunks).await.unwrap();
        store
    }

    fn cv(name: &'static str) -> Cv {
        Cv {
            id: Uuid::new_v4(),
            name,
        }
    }

    #[tokio::test]
    async fn test_never_returns_more_than_top_n() {
        let embedder = HashEmbedder::new(1024);
        let cvs: Vec<Cv> = ["Ana", "Ben", "Cai", "Dee", "Eli"].into_iter().map(cv).collect();
        let chunks = cvs
            .iter()
            .flat_map(|c| {
                (0..3)
                    .map(|i| chunk(&embedder, c, i, "rust backend engineer"))
                    .collect::<Vec<_>>()
            })
            .collect();
        let store = store_with(&embedder, chunks).await;

        let selected = select_candidates(&embedder, &store, "rust engineer", 2)
            .await
            .unwrap();
        assert_eq!(selected.len(), 2);
        assert_ne!(selected[0].cv_id, selected[1].cv_id);
    }

    #[tokio::test]
    async fn test_widens_search_past_a_dominant_cv() {
        let embedder = HashEmbedder::new(1024);
        let dominant = cv("Ana");
        let others = [cv("Ben"), cv("Cai")];
        let mut chunks: Vec<CvChunk> = (0..20)
            .map(|i| chunk(&embedder, &dominant, i, "kubernetes terraform platform"))
            .collect();
        chunks.extend(others.iter().map(|c| chunk(&embedder, c, 0, "watercolor painting")));
        let store = store_with(&embedder, chunks).await;

        let selected = select_candidates(&embedder, &store, "kubernetes terraform platform", 3)
            .await
            .unwrap();
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].cv_id, dominant.id);
        assert_eq!(selected[0].excerpts.len(), MAX_EXCERPTS);
        assert_eq!(selected[0].excerpts[0], "kubernetes terraform platform");
    }

    #[tokio::test]
    async fn test_returns_every_cv_when_fewer_than_top_n() {
        let embedder = HashEmbedder::new(1024);
        let cvs = [cv("Ana"), cv("Ben")];
        let chunks = cvs.iter().map(|c| chunk(&embedder, c, 0, "sales")).collect();
        let store = store_with(&embedder, chunks).await;

        let selected = select_candidates(&embedder, &store, "sales lead", 10)
            .await
            .unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn test_cv_matches_itself_first() {
        let embedder = HashEmbedder::new(1024);
        let jane = cv("Jane");
        let john = cv("John");
        let store = store_with(
            &embedder,
            vec![
                chunk(&embedder, &john, 0, "accounting ledger audits"),
                chunk(&embedder, &jane, 0, "rust tokio axum services"),
            ],
        )
        .await;

        let selected = select_candidates(
            &embedder,
            &store,
            "Candidate Name is Jane\n\nrust tokio axum services",
            1,
        )
        .await
        .unwrap();
        assert_eq!(selected[0].cv_id, jane.id);
        assert!((selected[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_invalid_requests_are_rejected() {
        let embedder = HashEmbedder::new(8);
        let store = InMemoryVectorStore::new("cvs");

        for (requirements, top_n) in [("  ", 3), ("rust", 0), ("rust", MAX_TOP_N + 1)] {
            let err = select_candidates(&embedder, &store, requirements, top_n)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{requirements:?} {top_n}");
        }
    }

    #[test]
    fn test_group_keeps_best_score_and_caps_excerpts() {
        let embedder = HashEmbedder::new(16);
        let ana = cv("Ana");
        let hits: Vec<ScoredChunk> = (0..5)
            .map(|i| ScoredChunk {
                chunk: chunk(&embedder, &ana, i, &format!("part {i}")),
                score: 0.9 - i as f32 * 0.1,
            })
            .collect();

        let grouped = group_by_cv(hits, 3);
        assert_eq!(grouped.len(), 1);
        assert!((grouped[0].score - 0.9).abs() < 1e-6);
        assert_eq!(grouped[0].excerpts, vec!["part 0", "part 1", "part 2"]);
    }

    #[test]
    fn test_excerpts_follow_document_order() {
        let embedder = HashEmbedder::new(16);
        let ana = cv("Ana");
        let hits: Vec<ScoredChunk> = [(4, 0.9), (1, 0.8), (7, 0.7)]
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: chunk(&embedder, &ana, i, &format!("part {i}")),
                score,
            })
            .collect();

        let grouped = group_by_cv(hits, 1);
        assert!((grouped[0].score - 0.9).abs() < 1e-6);
        assert_eq!(grouped[0].excerpts, vec!["part 1", "part 4", "part 7"]);
    }

    #[tokio::test]
    async fn test_summary_prompt_lists_candidates() {
        let llm = ScriptedChat::new("1. Jane Doe");
        let candidates = vec![CandidateMatch {
            cv_id: Uuid::new_v4(),
            candidate_name: "Jane Doe".to_string(),
            filename: "Jane_Doe.pdf".to_string(),
            score: 0.91,
            excerpts: vec!["Rust, Kafka".to_string()],
        }];

        let summary = summarize_selection(&llm, "Rust engineer", &candidates)
            .await
            .unwrap();
        assert_eq!(summary, "1. Jane Doe");
        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.contains("Select the top 1 candidates"));
        assert!(prompt.contains("Rust engineer"));
        assert!(prompt.contains("Jane Doe"));
    }
}
