//! Scenario, character and story endpoints: CRUD, upload-then-ingest and
//! the image pipeline.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use taleforge_domain::{Character, CharacterId, Scenario, ScenarioId, Story, StoryId};

use crate::api::extract::AuthAdmin;
use crate::api::http::ApiError;
use crate::app::App;
use crate::infrastructure::ports::{EntityPatch, FlagPatch, RepoError};
use crate::use_cases::assets::ImageTarget;
use crate::use_cases::catalog::{require_fields, require_flags};
use crate::use_cases::ingestion::{SCENARIO_CONTAINER, STORY_CONTAINER};
use crate::use_cases::story_graph::StoryGraphView;
use crate::use_cases::upload::Uploaded;

fn not_found_or_internal(e: RepoError) -> ApiError {
    if e.is_not_found() {
        ApiError::NotFound(e.to_string())
    } else {
        ApiError::Internal(e.to_string())
    }
}

fn created_status(created: bool) -> StatusCode {
    if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

// =============================================================================
// Upload
// =============================================================================

async fn upload_to(
    app: Arc<App>,
    container: &str,
    mut multipart: Multipart,
) -> Result<Json<Uploaded>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("the file needs a filename".to_string()))?;
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "text/plain".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
            .to_vec();

        let uploaded = app
            .use_cases
            .upload
            .execute(container, &file_name, bytes, &content_type)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok(Json(uploaded));
    }

    Err(ApiError::BadRequest(
        "a multipart field named 'file' is required".to_string(),
    ))
}

pub async fn upload_scenario(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    multipart: Multipart,
) -> Result<Json<Uploaded>, ApiError> {
    upload_to(app, SCENARIO_CONTAINER, multipart).await
}

pub async fn upload_story(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    multipart: Multipart,
) -> Result<Json<Uploaded>, ApiError> {
    upload_to(app, STORY_CONTAINER, multipart).await
}

// =============================================================================
// Scenarios
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(alias = "scenarioName", alias = "storyName")]
    name: Option<String>,
    blob_name: Option<String>,
}

impl IngestRequest {
    fn into_parts(self) -> Result<(String, String), ApiError> {
        match (self.name, self.blob_name) {
            (Some(name), Some(blob_name)) => Ok((name, blob_name)),
            _ => Err(ApiError::BadRequest(
                "name and blobName are required".to_string(),
            )),
        }
    }
}

pub async fn ingest_scenario(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<Scenario>), ApiError> {
    let (name, blob_name) = request.into_parts()?;

    let outcome = app.use_cases.ingest_scenario.execute(&name, &blob_name).await?;
    Ok((created_status(outcome.created), Json(outcome.scenario)))
}

pub async fn list_scenarios(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
) -> Result<Json<Vec<Scenario>>, ApiError> {
    Ok(Json(app.repos.scenarios.list_visible().await?))
}

pub async fn update_scenario(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    Json(patch): Json<EntityPatch>,
) -> Result<Json<Scenario>, ApiError> {
    require_fields(&patch)?;
    app.repos
        .scenarios
        .update(ScenarioId::from_uuid(id), &patch)
        .await
        .map(Json)
        .map_err(not_found_or_internal)
}

pub async fn update_all_scenarios(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(patch): Json<FlagPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_flags(&patch)?;
    let updated = app.repos.scenarios.update_all(&patch).await?;
    Ok(Json(json!({ "updated": updated })))
}

// =============================================================================
// Characters
// =============================================================================

pub async fn list_characters(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Path(scenario_id): Path<Uuid>,
) -> Result<Json<Vec<Character>>, ApiError> {
    let scenario_id = ScenarioId::from_uuid(scenario_id);
    app.repos
        .scenarios
        .get(scenario_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("scenario not found: {scenario_id}")))?;

    Ok(Json(app.repos.characters.list_for_scenario(scenario_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCharactersRequest {
    scenario_id: Option<Uuid>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCharactersResponse {
    characters: Vec<Character>,
    created_count: usize,
}

pub async fn generate_characters(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(request): Json<GenerateCharactersRequest>,
) -> Result<(StatusCode, Json<GeneratedCharactersResponse>), ApiError> {
    let scenario_id = request
        .scenario_id
        .ok_or_else(|| ApiError::BadRequest("scenarioId is required".to_string()))?;

    let generated = app
        .use_cases
        .generate_characters
        .execute(ScenarioId::from_uuid(scenario_id), request.description.as_deref())
        .await?;

    let created_count = generated.iter().filter(|g| g.created).count();
    let response = GeneratedCharactersResponse {
        characters: generated.into_iter().map(|g| g.character).collect(),
        created_count,
    };
    Ok((created_status(created_count > 0), Json(response)))
}

pub async fn update_character(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    Json(patch): Json<EntityPatch>,
) -> Result<Json<Character>, ApiError> {
    require_fields(&patch)?;
    app.repos
        .characters
        .update(CharacterId::from_uuid(id), &patch)
        .await
        .map(Json)
        .map_err(not_found_or_internal)
}

pub async fn update_all_characters(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(patch): Json<FlagPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_flags(&patch)?;
    let updated = app.repos.characters.update_all(&patch).await?;
    Ok(Json(json!({ "updated": updated })))
}

// =============================================================================
// Stories
// =============================================================================

pub async fn list_stories(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
) -> Result<Json<Vec<StoryGraphView>>, ApiError> {
    Ok(Json(app.use_cases.story_graphs.execute().await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryIngestionResponse {
    story: Story,
    moment_count: usize,
    choice_count: usize,
}

pub async fn ingest_story(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<StoryIngestionResponse>), ApiError> {
    let (name, blob_name) = request.into_parts()?;

    let outcome = app.use_cases.ingest_story.execute(&name, &blob_name).await?;
    Ok((
        StatusCode::CREATED,
        Json(StoryIngestionResponse {
            story: outcome.story,
            moment_count: outcome.moment_count,
            choice_count: outcome.choice_count,
        }),
    ))
}

pub async fn update_story(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    Json(patch): Json<EntityPatch>,
) -> Result<Json<Story>, ApiError> {
    require_fields(&patch)?;
    app.repos
        .stories
        .update(StoryId::from_uuid(id), &patch)
        .await
        .map(Json)
        .map_err(not_found_or_internal)
}

pub async fn update_all_stories(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(patch): Json<FlagPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_flags(&patch)?;
    let updated = app.repos.stories.update_all(&patch).await?;
    Ok(Json(json!({ "updated": updated })))
}

// =============================================================================
// Images
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    entity: Option<String>,
    id: Option<Uuid>,
    // Optional overrides for the stored record's title and description.
    title: Option<String>,
    description: Option<String>,
}

impl ImageRequest {
    fn target(&self) -> Result<ImageTarget, ApiError> {
        let (Some(entity), Some(id)) = (self.entity.as_deref(), self.id) else {
            return Err(ApiError::BadRequest("entity and id are required".to_string()));
        };

        match entity {
            "scenario" => Ok(ImageTarget::Scenario(ScenarioId::from_uuid(id))),
            "character" => Ok(ImageTarget::Character(CharacterId::from_uuid(id))),
            "story" => Ok(ImageTarget::Story(StoryId::from_uuid(id))),
            other => Err(ApiError::BadRequest(format!(
                "unknown entity kind: {other}"
            ))),
        }
    }
}

pub async fn generate_image(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(request): Json<ImageRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let target = request.target()?;
    let outcome = app
        .use_cases
        .images
        .generate(target, request.title.as_deref(), request.description.as_deref())
        .await?;

    Ok((
        created_status(outcome.generated),
        Json(json!({ "url": outcome.url, "generated": outcome.generated })),
    ))
}

pub async fn delete_image(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(request): Json<ImageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = request.target()?;
    let deleted = app.use_cases.images.delete(target).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
