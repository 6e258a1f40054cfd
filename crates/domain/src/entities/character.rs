//! Character entity and its structured document types.
//!
//! `items` and `ability` were free-form JSON columns in earlier iterations of
//! the platform; they are schema-validated here so malformed AI output is
//! caught at the ingestion boundary rather than at render time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CharacterId, ScenarioId};

/// A starting item carried by a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CharacterItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }
}

/// Stats and skills block produced by character generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterAbility {
    /// Stat name to score, e.g. "strength" -> 7. BTreeMap keeps the
    /// serialized order stable.
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// A playable character belonging to one scenario.
///
/// Natural key is `(scenario_id, name)`: ingestion get-or-creates on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    pub scenario_id: ScenarioId,
    pub name: String,
    pub name_en: Option<String>,
    pub role: String,
    pub description: String,
    pub description_en: Option<String>,
    pub items: Vec<CharacterItem>,
    pub ability: CharacterAbility,
    pub image_path: Option<String>,
    pub is_display: bool,
    pub is_deleted: bool,
}

impl Character {
    pub fn new(scenario_id: ScenarioId, name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            scenario_id,
            name: name.into(),
            name_en: None,
            role: String::new(),
            description: String::new(),
            description_en: None,
            items: Vec::new(),
            ability: CharacterAbility::default(),
            image_path: None,
            is_display: true,
            is_deleted: false,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
