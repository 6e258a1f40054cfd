//! Bearer-token authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;

use taleforge_domain::Admin;

use crate::api::http::ApiError;
use crate::app::App;

/// The authenticated admin for a protected endpoint. Extraction fails with
/// 401 on a missing, malformed, expired or revoked-account token.
pub struct AuthAdmin(pub Admin);

impl FromRequestParts<Arc<App>> for AuthAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        app: &Arc<App>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

        let admin = app
            .auth
            .authenticate(token)
            .await
            .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))?;

        Ok(AuthAdmin(admin))
    }
}
