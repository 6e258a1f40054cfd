//! Genre / mode / difficulty reference-data endpoints.
//!
//! Three entity types, one behavior: each handler delegates to the shared
//! catalog flow against its own table.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use taleforge_domain::CatalogEntry;

use crate::api::extract::AuthAdmin;
use crate::api::http::ApiError;
use crate::app::App;
use crate::infrastructure::ports::{EntityPatch, FlagPatch};
use crate::use_cases::catalog::CatalogOps;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    name: Option<String>,
}

async fn create(
    ops: &CatalogOps,
    request: CreateRequest,
) -> Result<(StatusCode, Json<CatalogEntry>), ApiError> {
    let name = request
        .name
        .ok_or_else(|| ApiError::BadRequest("a name is required".to_string()))?;

    let created = ops.get_or_create(&name).await?;
    let status = if created.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(created.row)))
}

async fn update(
    ops: &CatalogOps,
    id: Uuid,
    patch: EntityPatch,
) -> Result<Json<CatalogEntry>, ApiError> {
    Ok(Json(ops.update(id, &patch).await?))
}

async fn update_all(ops: &CatalogOps, patch: FlagPatch) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = ops.update_all(&patch).await?;
    Ok(Json(json!({ "updated": updated })))
}

macro_rules! catalog_handlers {
    ($ops:ident, $create:ident, $list:ident, $update:ident, $update_all:ident) => {
        pub async fn $create(
            State(app): State<Arc<App>>,
            _admin: AuthAdmin,
            Json(request): Json<CreateRequest>,
        ) -> Result<(StatusCode, Json<CatalogEntry>), ApiError> {
            create(&app.use_cases.$ops, request).await
        }

        pub async fn $list(
            State(app): State<Arc<App>>,
            _admin: AuthAdmin,
        ) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
            Ok(Json(app.use_cases.$ops.list().await?))
        }

        pub async fn $update(
            State(app): State<Arc<App>>,
            _admin: AuthAdmin,
            Path(id): Path<Uuid>,
            Json(patch): Json<EntityPatch>,
        ) -> Result<Json<CatalogEntry>, ApiError> {
            update(&app.use_cases.$ops, id, patch).await
        }

        pub async fn $update_all(
            State(app): State<Arc<App>>,
            _admin: AuthAdmin,
            Json(patch): Json<FlagPatch>,
        ) -> Result<Json<serde_json::Value>, ApiError> {
            update_all(&app.use_cases.$ops, patch).await
        }
    };
}

catalog_handlers!(genres, create_genre, list_genres, update_genre, update_all_genres);
catalog_handlers!(modes, create_mode, list_modes, update_mode, update_all_modes);
catalog_handlers!(
    difficulties,
    create_difficulty,
    list_difficulties,
    update_difficulty,
    update_all_difficulties
);
