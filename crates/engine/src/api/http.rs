//! HTTP routes and the API error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::app::App;
use crate::use_cases::assets::AssetError;
use crate::use_cases::auth::AuthError;
use crate::use_cases::catalog::CrudError;
use crate::use_cases::ingestion::IngestError;
use crate::use_cases::sessions::ReportError;

use super::{auth_routes, catalog_routes, content_routes, report_routes};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        // Auth
        .route("/api/auth/login", post(auth_routes::login))
        .route("/api/auth/logout", post(auth_routes::logout))
        .route("/api/auth/me", get(auth_routes::me))
        // Catalog reference data
        .route(
            "/api/genres",
            post(catalog_routes::create_genre).get(catalog_routes::list_genres),
        )
        .route("/api/genres/all", put(catalog_routes::update_all_genres))
        .route("/api/genres/{id}", put(catalog_routes::update_genre))
        .route(
            "/api/modes",
            post(catalog_routes::create_mode).get(catalog_routes::list_modes),
        )
        .route("/api/modes/all", put(catalog_routes::update_all_modes))
        .route("/api/modes/{id}", put(catalog_routes::update_mode))
        .route(
            "/api/difficulties",
            post(catalog_routes::create_difficulty).get(catalog_routes::list_difficulties),
        )
        .route(
            "/api/difficulties/all",
            put(catalog_routes::update_all_difficulties),
        )
        .route(
            "/api/difficulties/{id}",
            put(catalog_routes::update_difficulty),
        )
        // Scenarios
        .route("/api/scenarios", get(content_routes::list_scenarios))
        .route("/api/scenarios/upload", post(content_routes::upload_scenario))
        .route("/api/scenarios/ingest", post(content_routes::ingest_scenario))
        .route("/api/scenarios/all", put(content_routes::update_all_scenarios))
        .route("/api/scenarios/{id}", put(content_routes::update_scenario))
        // Characters; GET takes the owning scenario id, PUT a character id.
        .route(
            "/api/characters/generate",
            post(content_routes::generate_characters),
        )
        .route("/api/characters/all", put(content_routes::update_all_characters))
        .route(
            "/api/characters/{id}",
            get(content_routes::list_characters).put(content_routes::update_character),
        )
        // Stories
        .route("/api/stories", get(content_routes::list_stories))
        .route("/api/stories/upload", post(content_routes::upload_story))
        .route("/api/stories/ingest", post(content_routes::ingest_story))
        .route("/api/stories/all", put(content_routes::update_all_stories))
        .route("/api/stories/{id}", put(content_routes::update_story))
        // Images
        .route(
            "/api/images",
            put(content_routes::generate_image).delete(content_routes::delete_image),
        )
        // Users and reporting
        .route("/api/users", get(report_routes::list_users))
        .route("/api/users/all", put(report_routes::update_all_users))
        .route("/api/users/{id}", put(report_routes::update_user))
        .route(
            "/api/users/{id}/story-sessions",
            get(report_routes::story_sessions),
        )
        .route(
            "/api/users/{id}/play-sessions",
            get(report_routes::play_sessions),
        )
        .route("/api/stats", get(report_routes::stats))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Error handling
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
    /// AI work succeeded but persistence failed; the generated payload is
    /// echoed so nothing is lost.
    PersistFailed {
        message: String,
        ai_response: serde_json::Value,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": message })),
                )
                    .into_response()
            }
            ApiError::PersistFailed {
                message,
                ai_response,
            } => {
                tracing::error!(%message, "persist failed after AI call");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": message, "aiResponse": ai_response })),
                )
                    .into_response()
            }
        }
    }
}

impl From<crate::infrastructure::ports::RepoError> for ApiError {
    fn from(e: crate::infrastructure::ports::RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<CrudError> for ApiError {
    fn from(e: CrudError) -> Self {
        match e {
            CrudError::Validation(message) => ApiError::BadRequest(message),
            CrudError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            CrudError::Repo(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::ScenarioNotFound(_) => ApiError::NotFound(e.to_string()),
            IngestError::Persist { reason, ai_payload } => ApiError::PersistFailed {
                message: format!("failed to persist AI output: {reason}"),
                ai_response: ai_payload,
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AssetError> for ApiError {
    fn from(e: AssetError) -> Self {
        match e {
            AssetError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::UserNotFound(_) => ApiError::NotFound(e.to_string()),
            ReportError::Repo(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            AuthError::InvalidToken => ApiError::BadRequest(e.to_string()),
            AuthError::Repo(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}
