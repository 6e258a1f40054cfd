//! Admin authentication: login, logout and bearer-token verification.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use taleforge_domain::Admin;

use crate::infrastructure::auth::{PasswordVault, TokenError, TokenPair, TokenService};
use crate::infrastructure::ports::{AdminRepo, ClockPort, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<TokenError> for AuthError {
    fn from(_: TokenError) -> Self {
        Self::InvalidToken
    }
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub admin: Admin,
    pub tokens: TokenPair,
}

pub struct AuthService {
    admins: Arc<dyn AdminRepo>,
    tokens: Arc<TokenService>,
    clock: Arc<dyn ClockPort>,
}

impl AuthService {
    pub fn new(
        admins: Arc<dyn AdminRepo>,
        tokens: Arc<TokenService>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            admins,
            tokens,
            clock,
        }
    }

    /// Inactive and soft-deleted accounts fail exactly like a bad password.
    pub async fn login(&self, name: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(mut admin) = self.admins.get_by_name(name).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !admin.is_active || admin.is_deleted {
            return Err(AuthError::InvalidCredentials);
        }
        if !PasswordVault::verify(password, &admin.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        self.admins.record_login(admin.id, now).await?;
        admin.login_at = Some(now);

        let tokens = self.tokens.issue_pair(admin.id)?;
        tracing::info!(admin = %admin.name, "admin logged in");
        Ok(LoginOutcome { admin, tokens })
    }

    /// Blacklist the refresh token's JTI until its natural expiry.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.tokens.verify(refresh_token, "refresh")?;

        if self.admins.is_token_blacklisted(&claims.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        let expires_at: DateTime<Utc> = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AuthError::InvalidToken)?;
        self.admins.blacklist_token(&claims.jti, expires_at).await?;

        tracing::info!(jti = %claims.jti, "refresh token blacklisted");
        Ok(())
    }

    /// Resolve a bearer access token to its active admin.
    pub async fn authenticate(&self, access_token: &str) -> Result<Admin, AuthError> {
        let claims = self.tokens.verify(access_token, "access")?;
        let admin_id = claims.admin_id()?;

        let admin = self
            .admins
            .get(admin_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !admin.is_active || admin.is_deleted {
            return Err(AuthError::InvalidToken);
        }

        Ok(admin)
    }
}

/// Create the first admin account from the environment if it is absent.
pub async fn seed_admin(
    admins: &dyn AdminRepo,
    name: &str,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<bool, AuthError> {
    if admins.get_by_name(name).await?.is_some() {
        return Ok(false);
    }

    let hash = PasswordVault::hash(password)
        .map_err(|e| RepoError::Serialization(format!("password hash: {e}")))?;
    let admin = Admin::new(name, email, hash, now).superuser();
    admins.create(&admin).await?;

    tracing::info!(admin = name, "seeded initial admin account");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::ports::MockAdminRepo;
    use chrono::Duration;

    fn token_service() -> Arc<TokenService> {
        Arc::new(TokenService::new(
            "test-secret",
            Duration::minutes(30),
            Duration::days(14),
            Arc::new(SystemClock::new()),
        ))
    }

    fn admin_named(name: &str, password: &str) -> Admin {
        let hash = PasswordVault::hash(password).expect("hashable");
        Admin::new(name, "ops@example.com", hash, Utc::now())
    }

    #[tokio::test]
    async fn login_issues_tokens_and_records_the_time() {
        let admin = admin_named("ops", "s3cret");
        let admin_id = admin.id;

        let mut admins = MockAdminRepo::new();
        admins
            .expect_get_by_name()
            .returning(move |_| Ok(Some(admin.clone())));
        admins
            .expect_record_login()
            .withf(move |id, _| *id == admin_id)
            .times(1)
            .returning(|_, _| Ok(()));

        let auth = AuthService::new(Arc::new(admins), token_service(), Arc::new(SystemClock::new()));
        let outcome = auth.login("ops", "s3cret").await.expect("logs in");

        assert_eq!(outcome.admin.id, admin_id);
        assert!(outcome.admin.login_at.is_some());
        assert!(!outcome.tokens.access_token.is_empty());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_admin_fail_alike() {
        let admin = admin_named("ops", "s3cret");

        let mut admins = MockAdminRepo::new();
        admins.expect_get_by_name().returning(move |name| {
            Ok((name == "ops").then(|| admin.clone()))
        });

        let auth = AuthService::new(Arc::new(admins), token_service(), Arc::new(SystemClock::new()));

        assert!(matches!(
            auth.login("ops", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "s3cret").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn inactive_admin_cannot_log_in() {
        let mut admin = admin_named("ops", "s3cret");
        admin.is_active = false;

        let mut admins = MockAdminRepo::new();
        admins
            .expect_get_by_name()
            .returning(move |_| Ok(Some(admin.clone())));

        let auth = AuthService::new(Arc::new(admins), token_service(), Arc::new(SystemClock::new()));
        assert!(matches!(
            auth.login("ops", "s3cret").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn logout_blacklists_the_refresh_jti() {
        let tokens = token_service();
        let pair = tokens
            .issue_pair(taleforge_domain::AdminId::new())
            .expect("issuable");

        let mut admins = MockAdminRepo::new();
        admins
            .expect_is_token_blacklisted()
            .returning(|_| Ok(false));
        admins
            .expect_blacklist_token()
            .times(1)
            .returning(|_, _| Ok(()));

        let auth = AuthService::new(Arc::new(admins), tokens, Arc::new(SystemClock::new()));
        auth.logout(&pair.refresh_token).await.expect("logs out");
    }

    #[tokio::test]
    async fn a_second_logout_with_the_same_token_fails() {
        let tokens = token_service();
        let pair = tokens
            .issue_pair(taleforge_domain::AdminId::new())
            .expect("issuable");

        let mut admins = MockAdminRepo::new();
        admins
            .expect_is_token_blacklisted()
            .returning(|_| Ok(true));
        admins.expect_blacklist_token().never();

        let auth = AuthService::new(Arc::new(admins), tokens, Arc::new(SystemClock::new()));
        assert!(matches!(
            auth.logout(&pair.refresh_token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn logout_rejects_an_access_token() {
        let tokens = token_service();
        let pair = tokens
            .issue_pair(taleforge_domain::AdminId::new())
            .expect("issuable");

        let auth = AuthService::new(
            Arc::new(MockAdminRepo::new()),
            tokens,
            Arc::new(SystemClock::new()),
        );
        assert!(matches!(
            auth.logout(&pair.access_token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let admin = admin_named("ops", "s3cret");

        let mut admins = MockAdminRepo::new();
        admins
            .expect_get_by_name()
            .returning(move |_| Ok(Some(admin.clone())));
        admins.expect_create().never();

        let seeded = seed_admin(&admins, "ops", "ops@example.com", "s3cret", Utc::now())
            .await
            .expect("checks");
        assert!(!seeded);
    }
}
