//! Taleforge Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taleforge_engine::infrastructure::auth::TokenService;
use taleforge_engine::infrastructure::blob_storage::BlobStorageClient;
use taleforge_engine::infrastructure::clock::SystemClock;
use taleforge_engine::infrastructure::image_gen::ImageApiClient;
use taleforge_engine::infrastructure::openai::OpenAiClient;
use taleforge_engine::infrastructure::persistence::{connect, ensure_schema};
use taleforge_engine::infrastructure::ports::ClockPort;
use taleforge_engine::use_cases::auth::seed_admin;
use taleforge_engine::{api, App, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine normally runs from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taleforge_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Taleforge Engine");

    // Load configuration once; handlers never read the environment.
    let config = AppConfig::from_env()?;

    // Content store
    let pool = connect(&config.database_path).await?;
    ensure_schema(&pool).await?;
    tracing::info!(path = %config.database_path, "Content store ready");

    // External services
    let llm = Arc::new(OpenAiClient::new(
        &config.openai_base_url,
        &config.openai_api_key,
        &config.openai_model,
    ));
    let image_gen = Arc::new(ImageApiClient::new(
        &config.image_api_base_url,
        &config.image_api_key,
        &config.image_model,
    ));
    let storage = Arc::new(BlobStorageClient::new(
        &config.storage_base_url,
        &config.storage_sas_token,
    ));

    let clock = Arc::new(SystemClock::new());
    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        config.access_token_ttl,
        config.refresh_token_ttl,
        clock.clone(),
    ));

    let app = Arc::new(App::new(pool, llm, image_gen, storage, tokens));

    // Seed the first admin account when the environment provides one.
    if let Some(seed) = &config.admin_seed {
        seed_admin(
            app.repos.admins.as_ref(),
            &seed.name,
            &seed.email,
            &seed.password,
            clock.now(),
        )
        .await?;
    }

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer_from_env() {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer_from_env() -> Option<CorsLayer> {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let allowed_origins = allowed_origins?;

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        // The admin console sends Authorization and JSON bodies, both trigger preflights.
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
