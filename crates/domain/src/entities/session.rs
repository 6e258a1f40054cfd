//! Session records written by the gameplay services.
//!
//! This backend only reads sessions, for reporting and statistics. Progress
//! percentages are computed by the session-writing service and rendered here
//! as stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    CharacterId, ChoiceId, DifficultyId, GenreId, ModeId, MomentId, ScenarioId, SessionId, StoryId,
    UserId,
};

/// Lifecycle state shared by all session kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }
}

/// One past transition in a story session's history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStep {
    pub moment_id: MomentId,
    #[serde(default)]
    pub choice_id: Option<ChoiceId>,
    #[serde(default)]
    pub action_type: Option<String>,
}

/// A user's progress through a branching story.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySession {
    pub id: SessionId,
    pub user_id: UserId,
    pub story_id: StoryId,
    pub current_moment_id: Option<MomentId>,
    /// Rendered as stored; the denominator is the session writer's contract.
    pub progress_pct: f64,
    pub status: SessionStatus,
    pub history: Vec<HistoryStep>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// One recorded choice within a single/multi play session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    pub round: u32,
    pub action_type: String,
    #[serde(default)]
    pub description: String,
}

/// Which gameplay mode wrote a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    Single,
    Multi,
}

impl PlayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }
}

impl std::fmt::Display for PlayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single- or multi-mode gameplay session over a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySession {
    pub id: SessionId,
    pub user_id: UserId,
    pub play_mode: PlayMode,
    pub scenario_id: Option<ScenarioId>,
    pub genre_id: Option<GenreId>,
    pub difficulty_id: Option<DifficultyId>,
    pub mode_id: Option<ModeId>,
    pub character_id: Option<CharacterId>,
    pub choice_history: Vec<ChoiceRecord>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}
