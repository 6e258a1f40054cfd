//! Scenario ingestion: summarize an uploaded narrative text into a premise.

use std::sync::Arc;

use taleforge_domain::Scenario;

use crate::infrastructure::ports::{LlmPort, LlmRequest, ScenarioRepo, StoragePort};
use crate::prompt_templates;
use crate::use_cases::ingestion::{decode_text, IngestError, SCENARIO_CONTAINER};

#[derive(Debug)]
pub struct ScenarioIngestion {
    pub scenario: Scenario,
    /// False when a scenario with this title already existed; the stored
    /// row wins and the fresh summary is discarded.
    pub created: bool,
}

pub struct IngestScenario {
    storage: Arc<dyn StoragePort>,
    llm: Arc<dyn LlmPort>,
    scenarios: Arc<dyn ScenarioRepo>,
}

impl IngestScenario {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        llm: Arc<dyn LlmPort>,
        scenarios: Arc<dyn ScenarioRepo>,
    ) -> Self {
        Self {
            storage,
            llm,
            scenarios,
        }
    }

    /// `scenario_name` is the natural key of the resulting scenario;
    /// `blob_name` locates the uploaded source text.
    pub async fn execute(
        &self,
        scenario_name: &str,
        blob_name: &str,
    ) -> Result<ScenarioIngestion, IngestError> {
        let bytes = self
            .storage
            .download(SCENARIO_CONTAINER, blob_name)
            .await
            .map_err(|e| IngestError::Download(e.to_string()))?;
        let narrative_text = decode_text(bytes, blob_name)?;

        let request = LlmRequest::new(prompt_templates::scenario_summary_prompt(&narrative_text))
            .with_system_prompt(prompt_templates::SCENARIO_ANALYST_SYSTEM)
            .with_temperature(0.7)
            .with_max_tokens(2000)
            .expecting_json();

        let response = self
            .llm
            .generate(request)
            .await
            .map_err(|e| IngestError::Ai(e.to_string()))?;

        let summary: serde_json::Value = serde_json::from_str(&response.content)
            .map_err(|e| IngestError::Malformed(e.to_string()))?;

        let description = summary
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let (scenario, created) = self
            .scenarios
            .get_or_create(scenario_name, description)
            .await
            .map_err(|e| IngestError::persist(e, summary.clone()))?;

        tracing::info!(title = %scenario.title, created, "scenario ingested");
        Ok(ScenarioIngestion { scenario, created })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        LlmError, LlmResponse, MockLlmPort, MockScenarioRepo, MockStoragePort, StorageError,
    };

    fn storage_with(text: &'static str) -> MockStoragePort {
        let mut storage = MockStoragePort::new();
        storage
            .expect_download()
            .withf(|container, blob| container == "scenarios" && blob == "fox.txt")
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
    async fn summary_description_lands_on_the_scenario() {
        let storage = storage_with("a fox outwits a crow");
        let llm = llm_with(r#"{"description": "A cunning fox tricks a vain crow."}"#);

        let mut scenarios = MockScenarioRepo::new();
        scenarios
            .expect_get_or_create()
            .withf(|title, description| {
                title == "The Fox" && description == "A cunning fox tricks a vain crow."
            })
            .returning(|title, description| Ok((Scenario::new(title, description), true)));

        let ingest = IngestScenario::new(Arc::new(storage), Arc::new(llm), Arc::new(scenarios));
        let outcome = ingest.execute("The Fox", "fox.txt").await.expect("ingests");

        assert!(outcome.created);
        assert_eq!(outcome.scenario.title, "The Fox");
    }

    #[tokio::test]
    async fn existing_title_short_circuits_to_the_stored_row() {
        let storage = storage_with("same story again");
        let llm = llm_with(r#"{"description": "fresh summary"}"#);

        let mut scenarios = MockScenarioRepo::new();
        scenarios
            .expect_get_or_create()
            .returning(|title, _| Ok((Scenario::new(title, "stored summary"), false)));

        let ingest = IngestScenario::new(Arc::new(storage), Arc::new(llm), Arc::new(scenarios));
        let outcome = ingest.execute("The Fox", "fox.txt").await.expect("ingests");

        assert!(!outcome.created);
        assert_eq!(outcome.scenario.description, "stored summary");
    }

    #[tokio::test]
    async fn missing_blob_fails_the_download_stage() {
        let mut storage = MockStoragePort::new();
        storage
            .expect_download()
            .returning(|_, blob| Err(StorageError::NotFound(blob.to_string())));
        let mut llm = MockLlmPort::new();
        llm.expect_generate().never();

        let ingest = IngestScenario::new(
            Arc::new(storage),
            Arc::new(llm),
            Arc::new(MockScenarioRepo::new()),
        );

        let result = ingest.execute("The Fox", "fox.txt").await;
        assert!(matches!(result, Err(IngestError::Download(_))));
    }

    #[tokio::test]
    async fn llm_failure_is_the_ai_stage() {
        let storage = storage_with("text");
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .returning(|_| Err(LlmError::RequestFailed("upstream 503".to_string())));

        let ingest = IngestScenario::new(
            Arc::new(storage),
            Arc::new(llm),
            Arc::new(MockScenarioRepo::new()),
        );

        let result = ingest.execute("The Fox", "fox.txt").await;
        assert!(matches!(result, Err(IngestError::Ai(_))));
    }

    #[tokio::test]
    async fn non_json_response_is_malformed() {
        let storage = storage_with("text");
        let llm = llm_with("Sure! Here is your summary:");

        let ingest = IngestScenario::new(
            Arc::new(storage),
            Arc::new(llm),
            Arc::new(MockScenarioRepo::new()),
        );

        let result = ingest.execute("The Fox", "fox.txt").await;
        assert!(matches!(result, Err(IngestError::Malformed(_))));
    }

    #[tokio::test]
    async fn persist_failure_echoes_the_ai_payload() {
        let storage = storage_with("text");
        let llm = llm_with(r#"{"description": "summary"}"#);

        let mut scenarios = MockScenarioRepo::new();
        scenarios.expect_get_or_create().returning(|_, _| {
            Err(crate::infrastructure::ports::RepoError::database(
                "scenario insert",
                "disk full",
            ))
        });

        let ingest = IngestScenario::new(Arc::new(storage), Arc::new(llm), Arc::new(scenarios));
        let result = ingest.execute("The Fox", "fox.txt").await;

        match result {
            Err(IngestError::Persist { ai_payload, .. }) => {
                assert_eq!(ai_payload["description"], "summary");
            }
            other => panic!("expected persist failure, got {other:?}"),
        }
    }
}
