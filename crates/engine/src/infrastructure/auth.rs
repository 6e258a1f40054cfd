//! JWT issuing/verification and password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use taleforge_domain::AdminId;

use crate::infrastructure::ports::ClockPort;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Token expired")]
    Expired,
    #[error("Wrong token type: expected {expected}")]
    WrongType { expected: &'static str },
}

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin id.
    pub sub: String,
    /// Unique token id, used for refresh-token blacklisting.
    pub jti: String,
    /// Expiry as unix seconds.
    pub exp: i64,
    /// "access" or "refresh".
    pub token_type: String,
}

impl Claims {
    pub fn admin_id(&self) -> Result<AdminId, TokenError> {
        AdminId::parse(&self.sub).map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies the access/refresh token pair.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn ClockPort>,
}

impl TokenService {
    pub fn new(
        secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
            clock,
        }
    }

    pub fn issue_pair(&self, admin_id: AdminId) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(admin_id, "access", self.access_ttl)?,
            refresh_token: self.issue(admin_id, "refresh", self.refresh_ttl)?,
        })
    }

    fn issue(
        &self,
        admin_id: AdminId,
        token_type: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: admin_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: (self.clock.now() + ttl).timestamp(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    /// Verify a token of the expected type and return its claims.
    ///
    /// Expiry is checked against the injected clock rather than the JWT
    /// library's system clock.
    pub fn verify(&self, token: &str, expected_type: &'static str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }

        if data.claims.token_type != expected_type {
            return Err(TokenError::WrongType {
                expected: expected_type,
            });
        }

        Ok(data.claims)
    }
}

/// Argon2 password hashing.
pub struct PasswordVault;

impl PasswordVault {
    pub fn hash(password: &str) -> Result<String, String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| e.to_string())
    }

    pub fn verify(password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;

    fn service() -> TokenService {
        TokenService::new(
            "test-secret",
            Duration::minutes(30),
            Duration::days(14),
            Arc::new(SystemClock::new()),
        )
    }

    #[test]
    fn issued_pair_round_trips() {
        let service = service();
        let admin_id = AdminId::new();

        let pair = service.issue_pair(admin_id).expect("issuable");

        let access = service.verify(&pair.access_token, "access").expect("valid");
        assert_eq!(access.admin_id().expect("uuid"), admin_id);
        assert_eq!(access.token_type, "access");

        let refresh = service
            .verify(&pair.refresh_token, "refresh")
            .expect("valid");
        assert_eq!(refresh.token_type, "refresh");
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let service = service();
        let pair = service.issue_pair(AdminId::new()).expect("issuable");

        let result = service.verify(&pair.refresh_token, "access");
        assert!(matches!(result, Err(TokenError::WrongType { .. })));
    }

    #[test]
    fn expiry_follows_the_injected_clock() {
        use crate::infrastructure::ports::MockClockPort;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let base = chrono::DateTime::from_timestamp(1_767_225_600, 0).expect("valid timestamp");
        let calls = AtomicUsize::new(0);
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(move || {
            // Issuance sees the base time; verification runs 31 minutes later.
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                base
            } else {
                base + Duration::minutes(31)
            }
        });

        let service = TokenService::new(
            "test-secret",
            Duration::minutes(30),
            Duration::days(14),
            Arc::new(clock),
        );
        let pair = service.issue_pair(AdminId::new()).expect("issuable");

        assert!(matches!(
            service.verify(&pair.access_token, "access"),
            Err(TokenError::Expired)
        ));
        assert!(service.verify(&pair.refresh_token, "refresh").is_ok());
    }

    #[test]
    fn garbage_token_is_invalid() {
        let service = service();
        assert!(matches!(
            service.verify("not-a-jwt", "access"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = PasswordVault::hash("s3cret").expect("hashable");
        assert!(PasswordVault::verify("s3cret", &hash));
        assert!(!PasswordVault::verify("wrong", &hash));
        assert!(!PasswordVault::verify("s3cret", "not-a-hash"));
    }
}
