//! Prompt templates for the AI ingestion and image pipelines.
//!
//! The ingestion prompts demand strict JSON with a fixed key set; the parse
//! layer in `use_cases::ingestion` is the other half of that contract. Keys
//! here and the wire structs there must move together.

/// System prompt for summarizing a narrative text into a scenario premise.
pub const SCENARIO_ANALYST_SYSTEM: &str =
    "You are a story analyst. Summarize only the essentials useful for character creation, \
     concisely.";

/// User prompt asking for the scenario summary JSON.
pub fn scenario_summary_prompt(narrative_text: &str) -> String {
    format!(
        r#"Summarize the following story for character creation.
Format (JSON):
{{
  "setting": "era / place / atmosphere",
  "themes": ["theme 1", "theme 2"],
  "tone": "overall tone",
  "notable_characters": ["3-6 key figures or factions"],
  "conflicts": ["2-4 conflicts or challenges"],
  "description": "one-line summary"
}}
Story: {narrative_text}"#
    )
}

/// System prompt for generating playable characters from a scenario premise.
pub const CHARACTER_DESIGNER_SYSTEM: &str =
    "You are a creative character designer. Keep only the essentials useful for character \
     creation, concisely.";

/// User prompt asking for a batch of playable characters.
pub fn character_batch_prompt(scenario_description: &str) -> String {
    format!(
        r#"Based on the scenario below, design 3 to 5 distinct playable characters.
Format (JSON):
{{
  "characters": [
    {{
      "name": "character name",
      "role": "class / archetype (tank, scout, sage, diplomat, trickster, ...)",
      "stats": {{"strength": 1-10, "agility": 1-10, "knowledge": 1-10, "will": 1-10, "charm": 1-10, "luck": 1-10}},
      "skills": ["signature skill 1", "signature skill 2"],
      "starting_items": ["starting item 1", "starting item 2"],
      "playstyle": "behavior and dialogue tendencies, choice leanings, speech guide"
    }}
  ]
}}
Scenario: {scenario_description}"#
    )
}

/// User prompt converting a narrative text into a branching story graph.
///
/// Rules the parse layer relies on: moments are keyed by symbolic IDs,
/// ending moments omit the `choices` key entirely, and the output is pure
/// JSON with no surrounding prose.
pub fn story_graph_prompt(story_text: &str) -> String {
    format!(
        r#"You are a professional game writer who turns a given story into data for an interactive game the player advances by making choices.

[Your task]
Read the [input story] below and split it into 4-5 important moments following the flow of the story, producing a game scenario.

[Rules]
1. Scene split: divide scenes considering the story's opening, crisis, climax and ending, and give each scene a unique English ID (e.g. MOMENT_START).
2. Structure: every scene must carry its description under the 'description' key.
3. Choice structure: each scene's 'choices' must be an array of objects. Every object must contain 'action_type' and a 'next_moment_id' pointing at the next scene.
4. Endings: scenes that end the story must not contain the 'choices' key at all.
5. JSON only: output exactly the structure of the [output JSON format] below and nothing else.

[Input story]
---
{story_text}
---

[Output JSON format]
{{
  "title": "story title",
  "description": "overall background or theme of the story (2-3 sentence summary)",
  "start_moment_id": "MOMENT_START",
  "moments": {{
    "MOMENT_START": {{
      "description": "core goal of the first scene (e.g. what sets the protagonist on the adventure)",
      "choices": [
        {{ "action_type": "NEUTRAL", "next_moment_id": "MOMENT_CONFLICT" }}
      ]
    }},
    "MOMENT_CONFLICT": {{
      "description": "core goal of the second scene (e.g. the protagonist hits the first trial or conflict)",
      "choices": [
        {{ "action_type": "GOOD", "next_moment_id": "MOMENT_CLIMAX" }},
        {{ "action_type": "BAD", "next_moment_id": "ENDING_A" }}
      ]
    }},
    "ENDING_A": {{
      "description": "[bad ending] core goal of the tragic ending"
    }}
  }}
}}"#
    )
}

/// System prompt for rewriting an entity description into an image prompt.
pub const IMAGE_PROMPT_SYSTEM: &str =
    "You are an art director for a family-friendly pixel-art adventure game. You write short, \
     concrete image generation prompts.";

/// User prompt producing the final image generation prompt for an entity.
///
/// The style and safety constraints are part of the prompt, not enforced
/// downstream: the image API receives whatever comes back from this call.
pub fn image_prompt_rewrite(name: &str, description: &str) -> String {
    format!(
        r#"Write a single-paragraph image generation prompt for the subject below.
Constraints:
- 16-bit pixel art style, warm colors, storybook mood.
- Depict the subject only, no text or UI elements in the image.
- Family friendly: no violence, gore, horror or suggestive content.
Subject: {name}
Details: {description}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_prompt_carries_text_and_schema_keys() {
        let prompt = scenario_summary_prompt("a fox and a crow");
        assert!(prompt.contains("a fox and a crow"));
        for key in ["setting", "themes", "tone", "notable_characters", "conflicts"] {
            assert!(prompt.contains(key), "missing key {key}");
        }
    }

    #[test]
    fn character_prompt_asks_for_a_batch() {
        let prompt = character_batch_prompt("a haunted lighthouse");
        assert!(prompt.contains("3 to 5"));
        assert!(prompt.contains("starting_items"));
        assert!(prompt.contains("a haunted lighthouse"));
    }

    #[test]
    fn story_prompt_pins_the_graph_schema() {
        let prompt = story_graph_prompt("once upon a time");
        assert!(prompt.contains("start_moment_id"));
        assert!(prompt.contains("next_moment_id"));
        assert!(prompt.contains("must not contain the 'choices' key"));
    }
}
