//! AI ingestion pipelines: uploaded narrative text in, catalog content out.
//!
//! All three pipelines share a failure taxonomy that the API layer maps to
//! distinct responses. A persist failure after a successful AI call carries
//! the raw AI payload so operators can inspect what the model produced.

pub mod character;
pub mod scenario;
pub mod story;

pub use character::GenerateCharacters;
pub use scenario::IngestScenario;
pub use story::IngestStory;

/// Container holding uploaded scenario source texts.
pub const SCENARIO_CONTAINER: &str = "scenarios";
/// Container holding uploaded story source texts.
pub const STORY_CONTAINER: &str = "stories";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Repo(#[from] crate::infrastructure::ports::RepoError),
    #[error("file download failed: {0}")]
    Download(String),
    #[error("AI processing failed: {0}")]
    Ai(String),
    #[error("AI response malformed: {0}")]
    Malformed(String),
    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),
    #[error("failed to persist AI output: {reason}")]
    Persist {
        reason: String,
        ai_payload: serde_json::Value,
    },
}

impl IngestError {
    pub(crate) fn persist(reason: impl std::fmt::Display, ai_payload: serde_json::Value) -> Self {
        Self::Persist {
            reason: reason.to_string(),
            ai_payload,
        }
    }
}

/// Decode an uploaded text blob. Uploads are UTF-8 by contract; anything
/// else fails the download stage, not the AI stage.
pub(crate) fn decode_text(bytes: Vec<u8>, blob_name: &str) -> Result<String, IngestError> {
    String::from_utf8(bytes)
        .map_err(|_| IngestError::Download(format!("{blob_name} is not valid UTF-8 text")))
}
