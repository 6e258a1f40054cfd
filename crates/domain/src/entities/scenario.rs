//! Scenario entity - a gameplay premise used by the single and multi modes.

use serde::{Deserialize, Serialize};

use crate::ScenarioId;

/// A gameplay premise derived from an ingested narrative text.
///
/// `title` is the natural key: repeated ingestion of the same name is
/// idempotent (get-or-create).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: ScenarioId,
    pub title: String,
    pub title_en: Option<String>,
    pub description: String,
    pub description_en: Option<String>,
    pub image_path: Option<String>,
    pub is_display: bool,
    pub is_deleted: bool,
}

impl Scenario {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: ScenarioId::new(),
            title: title.into(),
            title_en: None,
            description: description.into(),
            description_en: None,
            image_path: None,
            is_display: true,
            is_deleted: false,
        }
    }
}
