//! Per-session UI state: uploaded CVs, the current candidate selection and
//! the two chat transcripts. Sessions never see each other's state.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::{CandidateMatch, CvDocument};
use crate::models::session::{ChatMode, ConversationTurn, Session};

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Session {
        let session = Session::new();
        self.inner
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    /// Returns a snapshot of the session and marks it active.
    pub async fn get(&self, id: Uuid) -> Result<Session, AppError> {
        self.update(id, |s| s.clone()).await
    }

    /// Applies `f` to the session under the write lock.
    async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, AppError> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.last_active = Utc::now();
        Ok(f(session))
    }

    /// Drops the session with its selection and transcripts. Stored CV
    /// vectors stay in the shared collection.
    pub async fn remove(&self, id: Uuid) -> Result<Session, AppError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| not_found(id))
    }

    /// Removes every session idle for longer than `max_idle`, returning how
    /// many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_active >= cutoff);
        before - sessions.len()
    }

    /// Runs [`evict_idle`](Self::evict_idle) every `every` until the task
    /// is aborted.
    pub fn spawn_idle_eviction(
        &self,
        max_idle: Duration,
        every: std::time::Duration,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(max_idle).await;
                if evicted > 0 {
                    info!(evicted, "Evicted idle sessions");
                }
            }
        })
    }

    pub async fn add_documents(
        &self,
        id: Uuid,
        documents: Vec<CvDocument>,
    ) -> Result<(), AppError> {
        self.update(id, |s| s.documents.extend(documents)).await
    }

    /// Replaces the selection. A new selection starts a fresh interview.
    pub async fn set_selection(
        &self,
        id: Uuid,
        requirements: String,
        candidates: Vec<CandidateMatch>,
    ) -> Result<(), AppError> {
        self.update(id, |s| {
            s.requirements = Some(requirements);
            s.selected_candidates = candidates;
            s.interview_transcript.clear();
        })
        .await
    }

    pub async fn append_turn(
        &self,
        id: Uuid,
        mode: ChatMode,
        turn: ConversationTurn,
    ) -> Result<(), AppError> {
        self.update(id, |s| s.transcript_mut(mode).push(turn)).await
    }

    /// Clears one transcript, returning how many turns were dropped.
    pub async fn clear_transcript(&self, id: Uuid, mode: ChatMode) -> Result<usize, AppError> {
        self.update(id, |s| {
            let transcript = s.transcript_mut(mode);
            let dropped = transcript.len();
            transcript.clear();
            dropped
        })
        .await
    }

    /// Drops every reference to stored CVs. Called after the collection is
    /// deleted; transcripts are kept.
    pub async fn forget_documents(&self) {
        let mut sessions = self.inner.write().await;
        for session in sessions.values_mut() {
            session.documents.clear();
            session.selected_candidates.clear();
            session.requirements = None;
        }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(question: &str) -> ConversationTurn {
        ConversationTurn {
            question: question.to_string(),
            answer: "answer".to_string(),
            context: vec![],
            asked_at: Utc::now(),
        }
    }

    fn candidate(name: &str) -> CandidateMatch {
        CandidateMatch {
            cv_id: Uuid::new_v4(),
            candidate_name: name.to_string(),
            filename: format!("{name}.pdf"),
            score: 0.9,
            excerpts: vec![],
        }
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = SessionStore::new();
        assert!(matches!(
            store.get(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;

        store
            .set_selection(a.id, "Rust".into(), vec![candidate("Jane")])
            .await
            .unwrap();
        store
            .append_turn(a.id, ChatMode::Interview, turn("Key skills?"))
            .await
            .unwrap();

        let b = store.get(b.id).await.unwrap();
        assert!(b.selected_candidates.is_empty());
        assert!(b.interview_transcript.is_empty());
    }

    #[tokio::test]
    async fn test_transcripts_are_append_only_per_mode() {
        let store = SessionStore::new();
        let id = store.create().await.id;
        store
            .append_turn(id, ChatMode::Explorer, turn("one"))
            .await
            .unwrap();
        store
            .append_turn(id, ChatMode::Explorer, turn("two"))
            .await
            .unwrap();
        store
            .append_turn(id, ChatMode::Interview, turn("three"))
            .await
            .unwrap();

        let session = store.get(id).await.unwrap();
        let questions: Vec<_> = session
            .transcript(ChatMode::Explorer)
            .iter()
            .map(|t| t.question.as_str())
            .collect();
        assert_eq!(questions, vec!["one", "two"]);
        assert_eq!(session.transcript(ChatMode::Interview).len(), 1);

        let cleared = store.clear_transcript(id, ChatMode::Explorer).await.unwrap();
        assert_eq!(cleared, 2);
        let session = store.get(id).await.unwrap();
        assert!(session.explorer_transcript.is_empty());
        assert_eq!(session.interview_transcript.len(), 1);
    }

    #[tokio::test]
    async fn test_new_selection_resets_interview() {
        let store = SessionStore::new();
        let id = store.create().await.id;
        store
            .append_turn(id, ChatMode::Interview, turn("old"))
            .await
            .unwrap();
        store
            .set_selection(id, "Python".into(), vec![candidate("John")])
            .await
            .unwrap();
        let session = store.get(id).await.unwrap();
        assert!(session.interview_transcript.is_empty());
        assert_eq!(session.requirements.as_deref(), Some("Python"));
    }

    #[tokio::test]
    async fn test_removed_session_is_gone() {
        let store = SessionStore::new();
        let id = store.create().await.id;
        let other = store.create().await.id;
        store
            .append_turn(id, ChatMode::Explorer, turn("one"))
            .await
            .unwrap();

        let removed = store.remove(id).await.unwrap();
        assert_eq!(removed.explorer_transcript.len(), 1);
        assert!(matches!(store.get(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(store.remove(id).await, Err(AppError::NotFound(_))));
        assert!(store.get(other).await.is_ok());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = SessionStore::new();
        let stale = store.create().await.id;
        let active = store.create().await.id;
        store
            .update(stale, |s| s.last_active = Utc::now() - Duration::hours(3))
            .await
            .unwrap();

        assert_eq!(store.evict_idle(Duration::hours(2)).await, 1);
        assert!(store.get(stale).await.is_err());
        assert!(store.get(active).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_marks_session_active() {
        let store = SessionStore::new();
        let id = store.create().await.id;
        store
            .update(id, |s| s.last_active = Utc::now() - Duration::hours(3))
            .await
            .unwrap();
        store.get(id).await.unwrap();
        assert_eq!(store.evict_idle(Duration::hours(2)).await, 0);
    }

    #[tokio::test]
    async fn test_forget_documents_clears_selection() {
        let store = SessionStore::new();
        let id = store.create().await.id;
        store
            .set_selection(id, "Rust".into(), vec![candidate("Jane")])
            .await
            .unwrap();
        store.forget_documents().await;
        let session = store.get(id).await.unwrap();
        assert!(session.selected_candidates.is_empty());
        assert!(session.requirements.is_none());
    }
}
