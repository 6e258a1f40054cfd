//! Story ingestion: convert an uploaded narrative text into a branching
//! moment/choice graph.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use taleforge_domain::{Choice, Moment, MomentId, Story};

use crate::infrastructure::ports::{LlmPort, LlmRequest, StoragePort, StoryRepo};
use crate::prompt_templates;
use crate::use_cases::ingestion::{decode_text, IngestError, STORY_CONTAINER};

/// One choice as it came back from the model. `next_moment_id` refers to a
/// symbolic moment key, not a database id.
#[derive(Debug, Deserialize)]
struct ChoiceSpec {
    #[serde(default)]
    action_type: String,
    #[serde(default)]
    next_moment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MomentSpec {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    /// Absent for ending moments, by prompt contract.
    #[serde(default)]
    choices: Option<Vec<ChoiceSpec>>,
}

/// The whole graph document. `moments` keeps the model's key order so the
/// stored graph reads in narrative order.
#[derive(Debug, Deserialize)]
struct StoryGraphDoc {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    start_moment_id: Option<String>,
    moments: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug)]
pub struct StoryIngestion {
    pub story: Story,
    pub moment_count: usize,
    pub choice_count: usize,
}

pub struct IngestStory {
    storage: Arc<dyn StoragePort>,
    llm: Arc<dyn LlmPort>,
    stories: Arc<dyn StoryRepo>,
}

impl IngestStory {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        llm: Arc<dyn LlmPort>,
        stories: Arc<dyn StoryRepo>,
    ) -> Self {
        Self {
            storage,
            llm,
            stories,
        }
    }

    /// `story_name` is the fallback title when the model omits one;
    /// `blob_name` locates the uploaded source text.
    pub async fn execute(
        &self,
        story_name: &str,
        blob_name: &str,
    ) -> Result<StoryIngestion, IngestError> {
        let bytes = self
            .storage
            .download(STORY_CONTAINER, blob_name)
            .await
            .map_err(|e| IngestError::Download(e.to_string()))?;
        let story_text = decode_text(bytes, blob_name)?;

        let request = LlmRequest::new(prompt_templates::story_graph_prompt(&story_text))
            .with_temperature(0.5)
            .expecting_json();

        let response = self
            .llm
            .generate(request)
            .await
            .map_err(|e| IngestError::Ai(e.to_string()))?;

        let payload: serde_json::Value = serde_json::from_str(&response.content)
            .map_err(|e| IngestError::Malformed(e.to_string()))?;
        let doc: StoryGraphDoc = serde_json::from_value(payload.clone())
            .map_err(|e| IngestError::Malformed(e.to_string()))?;

        if doc.moments.is_empty() {
            return Err(IngestError::Malformed("no moments in response".to_string()));
        }

        let (story, moments, choices) = assemble_graph(story_name, doc)?;

        self.stories
            .create_graph(&story, &moments, &choices)
            .await
            .map_err(|e| IngestError::persist(e, payload))?;

        tracing::info!(
            title = %story.title,
            moments = moments.len(),
            choices = choices.len(),
            "story ingested"
        );
        Ok(StoryIngestion {
            story,
            moment_count: moments.len(),
            choice_count: choices.len(),
        })
    }
}

/// Resolve symbolic moment keys into real ids and build the graph rows.
///
/// Choices pointing at unknown keys keep a None target rather than failing
/// the whole ingestion; a missing or unknown start key is logged and leaves
/// the story without an entry point.
fn assemble_graph(
    fallback_title: &str,
    doc: StoryGraphDoc,
) -> Result<(Story, Vec<Moment>, Vec<Choice>), IngestError> {
    let mut story = Story::new(
        doc.title.as_deref().unwrap_or(fallback_title),
        doc.description,
    );

    let mut specs: Vec<(String, MomentSpec)> = Vec::with_capacity(doc.moments.len());
    for (key, value) in doc.moments {
        let spec: MomentSpec = serde_json::from_value(value)
            .map_err(|e| IngestError::Malformed(format!("moment {key}: {e}")))?;
        specs.push((key, spec));
    }

    let mut key_to_id: HashMap<String, MomentId> = HashMap::with_capacity(specs.len());
    let mut moments = Vec::with_capacity(specs.len());
    for (key, spec) in &specs {
        let title = spec.title.clone().unwrap_or_else(|| key.clone());
        let moment = Moment::new(story.id, title, spec.description.clone());
        key_to_id.insert(key.clone(), moment.id);
        moments.push(moment);
    }

    match doc.start_moment_id.as_deref().and_then(|k| key_to_id.get(k)) {
        Some(start) => story.start_moment_id = Some(*start),
        None => tracing::warn!(
            title = %story.title,
            start_key = ?doc.start_moment_id,
            "story has no valid start moment"
        ),
    }

    let mut choices = Vec::new();
    for (key, spec) in &specs {
        let Some(choice_specs) = &spec.choices else {
            continue;
        };
        let moment_id = key_to_id[key.as_str()];
        for choice in choice_specs {
            let next = choice
                .next_moment_id
                .as_deref()
                .and_then(|k| key_to_id.get(k))
                .copied();
            choices.push(Choice::new(moment_id, choice.action_type.clone(), next));
        }
    }

    Ok((story, moments, choices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{LlmResponse, MockLlmPort, MockStoragePort, MockStoryRepo};

    const GRAPH: &str = r#"{
        "title": "The Fox and the Crow",
        "description": "A fable of flattery.",
        "start_moment_id": "MOMENT_START",
        "moments": {
            "MOMENT_START": {
                "description": "A crow finds a piece of cheese.",
                "choices": [
                    { "action_type": "NEUTRAL", "next_moment_id": "MOMENT_CONFLICT" }
                ]
            },
            "MOMENT_CONFLICT": {
                "description": "A fox begins to flatter the crow.",
                "choices": [
                    { "action_type": "GOOD", "next_moment_id": "ENDING_A" },
                    { "action_type": "BAD", "next_moment_id": "UNKNOWN_KEY" }
                ]
            },
            "ENDING_A": {
                "description": "The crow keeps its cheese."
            }
        }
    }"#;

    fn storage_with(text: &'static str) -> MockStoragePort {
        let mut storage = MockStoragePort::new();
        storage
            .expect_download()
            .withf(|container, blob| container == "stories" && blob == "fable.txt")
            .returning(move |_, _| Ok(text.as_bytes().to_vec()));
        storage
    }

    fn llm_with(content: &'static str) -> MockLlmPort {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().returning(move |_| {
            Ok(LlmResponse {
                content: content.to_string(),
                usage: None,
            })
        });
        llm
    }

    #[tokio::test]
    async fn graph_is_assembled_and_persisted_in_one_batch() {
        let storage = storage_with("once upon a time");
        let llm = llm_with(GRAPH);

        let mut stories = MockStoryRepo::new();
        stories
            .expect_create_graph()
            .withf(|story, moments, choices| {
                let start_is_first = story.start_moment_id == Some(moments[0].id);
                let ending_has_no_choices =
                    !choices.iter().any(|c| c.moment_id == moments[2].id);
                let dangling_is_none = choices
                    .iter()
                    .any(|c| c.action_type == "BAD" && c.next_moment_id.is_none());
                moments.len() == 3
                    && choices.len() == 3
                    && start_is_first
                    && ending_has_no_choices
                    && dangling_is_none
            })
            .returning(|_, _, _| Ok(()));

        let ingest = IngestStory::new(Arc::new(storage), Arc::new(llm), Arc::new(stories));
        let outcome = ingest
            .execute("fallback", "fable.txt")
            .await
            .expect("ingests");

        assert_eq!(outcome.story.title, "The Fox and the Crow");
        assert_eq!(outcome.moment_count, 3);
        assert_eq!(outcome.choice_count, 3);
    }

    #[tokio::test]
    async fn missing_title_falls_back_to_the_request_name() {
        let storage = storage_with("text");
        let llm = llm_with(
            r#"{"moments": {"M1": {"description": "only scene"}}}"#,
        );

        let mut stories = MockStoryRepo::new();
        stories
            .expect_create_graph()
            .withf(|story, _, _| story.title == "fallback" && story.start_moment_id.is_none())
            .returning(|_, _, _| Ok(()));

        let ingest = IngestStory::new(Arc::new(storage), Arc::new(llm), Arc::new(stories));
        let outcome = ingest
            .execute("fallback", "fable.txt")
            .await
            .expect("ingests");

        assert_eq!(outcome.story.title, "fallback");
    }

    #[tokio::test]
    async fn response_without_moments_is_malformed() {
        let storage = storage_with("text");
        let llm = llm_with(r#"{"title": "empty", "moments": {}}"#);

        let ingest = IngestStory::new(
            Arc::new(storage),
            Arc::new(llm),
            Arc::new(MockStoryRepo::new()),
        );

        let result = ingest.execute("fallback", "fable.txt").await;
        assert!(matches!(result, Err(IngestError::Malformed(_))));
    }

    #[tokio::test]
    async fn persist_failure_echoes_the_graph_payload() {
        let storage = storage_with("text");
        let llm = llm_with(GRAPH);

        let mut stories = MockStoryRepo::new();
        stories.expect_create_graph().returning(|_, _, _| {
            Err(crate::infrastructure::ports::RepoError::database(
                "story graph commit",
                "locked",
            ))
        });

        let ingest = IngestStory::new(Arc::new(storage), Arc::new(llm), Arc::new(stories));
        let result = ingest.execute("fallback", "fable.txt").await;

        match result {
            Err(IngestError::Persist { ai_payload, .. }) => {
                assert_eq!(ai_payload["title"], "The Fox and the Crow");
            }
            other => panic!("expected persist failure, got {other:?}"),
        }
    }
}
