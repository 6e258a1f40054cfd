//! Environment-backed configuration, read once at startup.

use anyhow::Context;
use chrono::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub server_host: String,
    pub server_port: u16,

    pub openai_base_url: String,
    pub openai_api_key: String,
    pub openai_model: String,

    pub image_api_base_url: String,
    pub image_api_key: String,
    pub image_model: String,

    pub storage_base_url: String,
    pub storage_sas_token: String,

    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,

    pub admin_seed: Option<AdminSeed>,
}

/// Initial admin account, created on boot when absent.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env_or("SERVER_PORT", "8080")
            .parse::<u16>()
            .context("SERVER_PORT must be a port number")?;

        let access_minutes = env_or("ACCESS_TOKEN_TTL_MINUTES", "30")
            .parse::<i64>()
            .context("ACCESS_TOKEN_TTL_MINUTES must be an integer")?;
        let refresh_days = env_or("REFRESH_TOKEN_TTL_DAYS", "14")
            .parse::<i64>()
            .context("REFRESH_TOKEN_TTL_DAYS must be an integer")?;

        let admin_seed = match (
            std::env::var("ADMIN_NAME").ok(),
            std::env::var("ADMIN_EMAIL").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(name), Some(email), Some(password)) => Some(AdminSeed {
                name,
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_path: env_or("DATABASE_PATH", "taleforge.db"),
            server_host: env_or("SERVER_HOST", "0.0.0.0"),
            server_port,

            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com"),
            openai_api_key: env_required("OPENAI_API_KEY")?,
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),

            image_api_base_url: env_or("IMAGE_API_BASE_URL", "https://api.openai.com"),
            image_api_key: env_or(
                "IMAGE_API_KEY",
                &std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            ),
            image_model: env_or("IMAGE_MODEL", "dall-e-3"),

            storage_base_url: env_required("STORAGE_BASE_URL")?,
            storage_sas_token: env_or("STORAGE_SAS_TOKEN", ""),

            jwt_secret: env_required("JWT_SECRET")?,
            access_token_ttl: Duration::minutes(access_minutes),
            refresh_token_ttl: Duration::days(refresh_days),

            admin_seed,
        })
    }
}
