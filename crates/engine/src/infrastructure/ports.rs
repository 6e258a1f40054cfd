//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete
//! types. Ports exist for:
//! - Database access (could swap SQLite -> Postgres)
//! - LLM calls (could swap the hosted completion API -> a local model)
//! - Image generation
//! - Object storage (could swap the blob REST surface -> S3)
//! - Clock (for testing)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use taleforge_domain::{
    Admin, AdminId, CatalogEntry, CatalogKind, Character, CharacterId, Choice, Moment, MomentId,
    PlayMode, PlaySession, Scenario, ScenarioId, Story, StoryId, StorySession, User, UserId,
};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn database(context: &str, e: impl std::fmt::Display) -> Self {
        Self::Database(format!("{context}: {e}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Image fetch failed: {0}")]
    FetchFailed(String),
    #[error("Service unavailable")]
    Unavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String),
    #[error("Storage request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),
}

// =============================================================================
// Shared Patch Types
// =============================================================================

/// Partial update for a single row. `name` doubles as `title` for the
/// title-bearing entities. At least one field must be present.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPatch {
    #[serde(alias = "title")]
    pub name: Option<String>,
    pub is_display: Option<bool>,
    pub is_deleted: Option<bool>,
}

impl EntityPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_display.is_none() && self.is_deleted.is_none()
    }
}

/// Bulk flag update applied to every row of an entity type.
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagPatch {
    pub is_display: Option<bool>,
    pub is_deleted: Option<bool>,
}

impl FlagPatch {
    pub fn is_empty(&self) -> bool {
        self.is_display.is_none() && self.is_deleted.is_none()
    }
}

// =============================================================================
// Database Ports (one per entity type)
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    fn kind(&self) -> CatalogKind;
    /// Get-or-create on the unique `name`. Returns `(row, created)`.
    async fn get_or_create(&self, name: &str) -> Result<(CatalogEntry, bool), RepoError>;
    async fn get(&self, id: Uuid) -> Result<Option<CatalogEntry>, RepoError>;
    async fn list_visible(&self) -> Result<Vec<CatalogEntry>, RepoError>;
    async fn update(&self, id: Uuid, patch: &EntityPatch) -> Result<CatalogEntry, RepoError>;
    async fn update_all(&self, patch: &FlagPatch) -> Result<u64, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScenarioRepo: Send + Sync {
    async fn get(&self, id: ScenarioId) -> Result<Option<Scenario>, RepoError>;
    /// Get-or-create on the natural key `title`. Returns `(row, created)`.
    async fn get_or_create(
        &self,
        title: &str,
        description: &str,
    ) -> Result<(Scenario, bool), RepoError>;
    async fn list_visible(&self) -> Result<Vec<Scenario>, RepoError>;
    async fn update(&self, id: ScenarioId, patch: &EntityPatch) -> Result<Scenario, RepoError>;
    async fn update_all(&self, patch: &FlagPatch) -> Result<u64, RepoError>;
    async fn set_image_path<'a>(
        &self,
        id: ScenarioId,
        image_path: Option<&'a str>,
    ) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepo: Send + Sync {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError>;
    /// Get-or-create on the natural key `(scenario_id, name)`. The candidate
    /// row is only persisted when no row with that key exists yet.
    async fn get_or_create(&self, candidate: &Character)
        -> Result<(Character, bool), RepoError>;
    async fn list_for_scenario(&self, scenario_id: ScenarioId)
        -> Result<Vec<Character>, RepoError>;
    async fn update(&self, id: CharacterId, patch: &EntityPatch) -> Result<Character, RepoError>;
    async fn update_all(&self, patch: &FlagPatch) -> Result<u64, RepoError>;
    async fn set_image_path<'a>(
        &self,
        id: CharacterId,
        image_path: Option<&'a str>,
    ) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryRepo: Send + Sync {
    async fn get(&self, id: StoryId) -> Result<Option<Story>, RepoError>;
    /// Persist a freshly ingested story graph in one transaction: the story
    /// row, all moments, the start-moment reference and all choices. A
    /// mid-batch failure leaves no partial graph behind.
    async fn create_graph(
        &self,
        story: &Story,
        moments: &[Moment],
        choices: &[Choice],
    ) -> Result<(), RepoError>;
    async fn list_visible(&self) -> Result<Vec<Story>, RepoError>;
    async fn moments_for_story(&self, story_id: StoryId) -> Result<Vec<Moment>, RepoError>;
    async fn choices_for_story(&self, story_id: StoryId) -> Result<Vec<Choice>, RepoError>;
    async fn get_moment(&self, id: MomentId) -> Result<Option<Moment>, RepoError>;
    async fn choices_for_moment(&self, moment_id: MomentId) -> Result<Vec<Choice>, RepoError>;
    async fn update(&self, id: StoryId, patch: &EntityPatch) -> Result<Story, RepoError>;
    async fn update_all(&self, patch: &FlagPatch) -> Result<u64, RepoError>;
    async fn set_image_path<'a>(
        &self,
        id: StoryId,
        image_path: Option<&'a str>,
    ) -> Result<(), RepoError>;
}

/// Which session foreign key a statistics query groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatDimension {
    Scenario,
    Genre,
    Difficulty,
    Character,
}

impl StatDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scenario => "scenario",
            Self::Genre => "genre",
            Self::Difficulty => "difficulty",
            Self::Character => "character",
        }
    }
}

/// Top-1 result of a group-by-count over session rows.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSelection {
    pub id: Uuid,
    pub name: String,
    pub count: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn story_sessions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<StorySession>, RepoError>;
    async fn play_sessions_for_user(&self, user_id: UserId)
        -> Result<Vec<PlaySession>, RepoError>;
    /// Most-selected dimension value for a mode, restricted to visible,
    /// non-deleted target rows. No matching sessions yields Ok(None).
    async fn top_selection(
        &self,
        mode: PlayMode,
        dimension: StatDimension,
    ) -> Result<Option<TopSelection>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminRepo: Send + Sync {
    async fn get(&self, id: AdminId) -> Result<Option<Admin>, RepoError>;
    async fn get_by_name(&self, name: &str) -> Result<Option<Admin>, RepoError>;
    async fn create(&self, admin: &Admin) -> Result<(), RepoError>;
    async fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<(), RepoError>;
    /// Refresh-token revocation list, keyed by JWT ID.
    async fn blacklist_token(&self, jti: &str, expires_at: DateTime<Utc>)
        -> Result<(), RepoError>;
    async fn is_token_blacklisted(&self, jti: &str) -> Result<bool, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepoError>;
    async fn list_visible(&self) -> Result<Vec<User>, RepoError>;
    async fn update(&self, id: UserId, patch: &EntityPatch) -> Result<User, RepoError>;
    async fn update_all(&self, patch: &FlagPatch) -> Result<u64, RepoError>;
}

// =============================================================================
// External Service Ports
// =============================================================================

/// A single-turn completion request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the API for strict JSON output (`response_format: json_object`).
    pub json_output: bool,
}

impl LlmRequest {
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            user_prompt: user_prompt.into(),
            temperature: None,
            max_tokens: None,
            json_output: false,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn expecting_json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Token usage information.
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from the completion API.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}

/// A generated image, addressable at a temporary, time-limited URL.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenPort: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenError>;
    /// Fetch the bytes behind a (temporary) image URL before it expires.
    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageGenError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Upload (overwrite) and return the blob's public URL.
    async fn upload(
        &self,
        container: &str,
        blob: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
    async fn download(&self, container: &str, blob: &str) -> Result<Vec<u8>, StorageError>;
    async fn exists(&self, container: &str, blob: &str) -> Result<bool, StorageError>;
    /// Delete a blob; deleting an already-absent blob is a success.
    async fn delete(&self, container: &str, blob: &str) -> Result<(), StorageError>;
    /// Deterministic public URL for a blob path, without touching the network.
    fn url_for(&self, container: &str, blob: &str) -> String;
}

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
