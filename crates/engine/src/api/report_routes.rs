//! User administration, session reporting and platform statistics.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use taleforge_domain::{User, UserId};

use crate::api::extract::AuthAdmin;
use crate::api::http::ApiError;
use crate::app::App;
use crate::infrastructure::ports::{EntityPatch, FlagPatch, RepoError};
use crate::use_cases::catalog::{require_fields, require_flags};
use crate::use_cases::sessions::{PlaySessionView, StorySessionView};
use crate::use_cases::stats::PlatformStats;

fn not_found_or_internal(e: RepoError) -> ApiError {
    if e.is_not_found() {
        ApiError::NotFound(e.to_string())
    } else {
        ApiError::Internal(e.to_string())
    }
}

pub async fn list_users(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(app.repos.users.list_visible().await?))
}

pub async fn update_user(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
    Json(patch): Json<EntityPatch>,
) -> Result<Json<User>, ApiError> {
    require_fields(&patch)?;
    app.repos
        .users
        .update(UserId::from_uuid(id), &patch)
        .await
        .map(Json)
        .map_err(not_found_or_internal)
}

pub async fn update_all_users(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(patch): Json<FlagPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_flags(&patch)?;
    let updated = app.repos.users.update_all(&patch).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn story_sessions(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StorySessionView>>, ApiError> {
    let views = app
        .use_cases
        .session_reports
        .story_sessions(UserId::from_uuid(id))
        .await?;
    Ok(Json(views))
}

pub async fn play_sessions(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PlaySessionView>>, ApiError> {
    let views = app
        .use_cases
        .session_reports
        .play_sessions(UserId::from_uuid(id))
        .await?;
    Ok(Json(views))
}

pub async fn stats(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
) -> Result<Json<PlatformStats>, ApiError> {
    Ok(Json(app.use_cases.stats.execute().await?))
}
