//! Admin auth endpoints.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use taleforge_domain::Admin;

use crate::api::extract::AuthAdmin;
use crate::api::http::ApiError;
use crate::app::App;
use crate::infrastructure::auth::TokenPair;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    name: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    admin: Admin,
    #[serde(flatten)]
    tokens: TokenPair,
}

pub async fn login(
    State(app): State<Arc<App>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(name), Some(password)) = (request.name, request.password) else {
        return Err(ApiError::BadRequest(
            "name and password are required".to_string(),
        ));
    };

    let outcome = app.auth.login(&name, &password).await?;
    Ok(Json(LoginResponse {
        admin: outcome.admin,
        tokens: outcome.tokens,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    refresh_token: Option<String>,
}

pub async fn logout(
    State(app): State<Arc<App>>,
    _admin: AuthAdmin,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(refresh_token) = request.refresh_token else {
        return Err(ApiError::BadRequest("a refresh token is required".to_string()));
    };

    app.auth.logout(&refresh_token).await?;
    Ok(Json(serde_json::json!({ "message": "logged out" })))
}

pub async fn me(AuthAdmin(admin): AuthAdmin) -> Json<Admin> {
    Json(admin)
}
