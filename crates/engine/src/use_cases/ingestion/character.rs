//! Character generation: design a batch of playable characters for a
//! scenario premise.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use taleforge_domain::{Character, CharacterAbility, CharacterItem, ScenarioId};

use crate::infrastructure::ports::{CharacterRepo, LlmPort, LlmRequest, ScenarioRepo};
use crate::prompt_templates;
use crate::use_cases::ingestion::IngestError;

/// One designed character as it came back from the model.
#[derive(Debug, Deserialize)]
struct CharacterSpec {
    #[serde(default)]
    name: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    stats: BTreeMap<String, i64>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    starting_items: Vec<String>,
    #[serde(default)]
    playstyle: String,
}

#[derive(Debug, Deserialize)]
struct CharacterBatch {
    #[serde(default)]
    characters: Vec<CharacterSpec>,
}

#[derive(Debug)]
pub struct GeneratedCharacter {
    pub character: Character,
    pub created: bool,
}

pub struct GenerateCharacters {
    llm: Arc<dyn LlmPort>,
    scenarios: Arc<dyn ScenarioRepo>,
    characters: Arc<dyn CharacterRepo>,
}

impl GenerateCharacters {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        scenarios: Arc<dyn ScenarioRepo>,
        characters: Arc<dyn CharacterRepo>,
    ) -> Self {
        Self {
            llm,
            scenarios,
            characters,
        }
    }

    /// `description` overrides the stored scenario description as the design
    /// premise when present.
    pub async fn execute(
        &self,
        scenario_id: ScenarioId,
        description: Option<&str>,
    ) -> Result<Vec<GeneratedCharacter>, IngestError> {
        // Only a missing row is a 404; a failing lookup stays a repo error.
        let scenario = self
            .scenarios
            .get(scenario_id)
            .await?
            .ok_or_else(|| IngestError::ScenarioNotFound(scenario_id.to_string()))?;

        let premise = description.unwrap_or(&scenario.description);
        let request =
            LlmRequest::new(prompt_templates::character_batch_prompt(premise))
                .with_system_prompt(prompt_templates::CHARACTER_DESIGNER_SYSTEM)
                .with_temperature(0.7)
                .with_max_tokens(2000)
                .expecting_json();

        let response = self
            .llm
            .generate(request)
            .await
            .map_err(|e| IngestError::Ai(e.to_string()))?;

        let payload: serde_json::Value = serde_json::from_str(&response.content)
            .map_err(|e| IngestError::Malformed(e.to_string()))?;
        let batch: CharacterBatch = serde_json::from_value(payload.clone())
            .map_err(|e| IngestError::Malformed(e.to_string()))?;

        let candidates: Vec<Character> = batch
            .characters
            .into_iter()
            .filter(|spec| !spec.name.trim().is_empty())
            .map(|spec| build_character(scenario_id, spec))
            .collect();

        if candidates.is_empty() {
            return Err(IngestError::Malformed(
                "no usable characters in response".to_string(),
            ));
        }

        let mut generated = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let (character, created) = self
                .characters
                .get_or_create(candidate)
                .await
                .map_err(|e| IngestError::persist(e, payload.clone()))?;
            generated.push(GeneratedCharacter { character, created });
        }

        tracing::info!(
            scenario = %scenario.title,
            count = generated.len(),
            "characters generated"
        );
        Ok(generated)
    }
}

fn build_character(scenario_id: ScenarioId, spec: CharacterSpec) -> Character {
    let description = format!("Role: {}\nPlaystyle: {}", spec.role, spec.playstyle);
    let mut character = Character::new(scenario_id, spec.name.trim())
        .with_role(spec.role)
        .with_description(description);

    character.items = spec
        .starting_items
        .into_iter()
        .map(CharacterItem::named)
        .collect();
    character.ability = CharacterAbility {
        stats: spec.stats,
        skills: spec.skills,
    };

    character
}
