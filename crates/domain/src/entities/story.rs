//! Story, Moment and Choice - the branching-narrative graph.
//!
//! A story owns moments; choices are directed edges between moments. The
//! graph is rooted at `start_moment_id`. Connectivity and acyclicity are not
//! enforced: loop-back branches are legal narrative design.

use serde::{Deserialize, Serialize};

use crate::{ChoiceId, MomentId, StoryId};

/// A branching interactive story assembled from an ingested text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub title_en: Option<String>,
    pub description: String,
    pub description_en: Option<String>,
    pub start_moment_id: Option<MomentId>,
    pub image_path: Option<String>,
    pub is_display: bool,
    pub is_deleted: bool,
}

impl Story {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: StoryId::new(),
            title: title.into(),
            title_en: None,
            description: description.into(),
            description_en: None,
            start_moment_id: None,
            image_path: None,
            is_display: true,
            is_deleted: false,
        }
    }
}

/// A scene node within a story.
///
/// A moment with no outgoing choices is an ending. That property is purely
/// structural and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moment {
    pub id: MomentId,
    pub story_id: StoryId,
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
}

impl Moment {
    pub fn new(story_id: StoryId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: MomentId::new(),
            story_id,
            title: title.into(),
            description: description.into(),
            image_path: None,
        }
    }
}

/// A directed edge leaving a moment.
///
/// `next_moment_id` is None for an unresolved or intentionally absent link;
/// when present it refers to a moment of the same story.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: ChoiceId,
    pub moment_id: MomentId,
    /// Free-form classifier, e.g. "NEUTRAL" / "GOOD" / "BAD".
    pub action_type: String,
    pub next_moment_id: Option<MomentId>,
}

impl Choice {
    pub fn new(
        moment_id: MomentId,
        action_type: impl Into<String>,
        next_moment_id: Option<MomentId>,
    ) -> Self {
        Self {
            id: ChoiceId::new(),
            moment_id,
            action_type: action_type.into(),
            next_moment_id,
        }
    }
}
