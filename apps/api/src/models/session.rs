use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::cv::{CandidateMatch, CvDocument};

/// Which conversation a turn belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// Questions about the currently selected candidates.
    Interview,
    /// Questions answered from the whole CV collection.
    Explorer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    /// Candidate names whose CV text was given to the model.
    pub context: Vec<String>,
    pub asked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub documents: Vec<CvDocument>,
    pub requirements: Option<String>,
    pub selected_candidates: Vec<CandidateMatch>,
    pub interview_transcript: Vec<ConversationTurn>,
    pub explorer_transcript: Vec<ConversationTurn>,
    pub created_at: DateTime<Utc>,
    /// Last time the session was read or changed through the API.
    pub last_active: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            documents: Vec::new(),
            requirements: None,
            selected_candidates: Vec::new(),
            interview_transcript: Vec::new(),
            explorer_transcript: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn transcript(&self, mode: ChatMode) -> &[ConversationTurn] {
        match mode {
            ChatMode::Interview => &self.interview_transcript,
            ChatMode::Explorer => &self.explorer_transcript,
        }
    }

    pub fn transcript_mut(&mut self, mode: ChatMode) -> &mut Vec<ConversationTurn> {
        match mode {
            ChatMode::Interview => &mut self.interview_transcript,
            ChatMode::Explorer => &mut self.explorer_transcript,
        }
    }
}
