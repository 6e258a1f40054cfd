//! Application state and composition.

use std::sync::Arc;

use sqlx::SqlitePool;

use taleforge_domain::CatalogKind;

use crate::infrastructure::{
    auth::TokenService,
    clock::SystemClock,
    persistence::{
        SqliteAdminRepo, SqliteCatalogRepo, SqliteCharacterRepo, SqliteScenarioRepo,
        SqliteSessionRepo, SqliteStoryRepo, SqliteUserRepo,
    },
    ports::{
        AdminRepo, CatalogRepo, CharacterRepo, ClockPort, ImageGenPort, LlmPort, ScenarioRepo,
        SessionRepo, StoragePort, StoryRepo, UserRepo,
    },
};
use crate::use_cases::{
    assets::EntityImages,
    auth::AuthService,
    catalog::CatalogOps,
    ingestion::{character::GenerateCharacters, scenario::IngestScenario, story::IngestStory},
    sessions::SessionReports,
    stats::ComputeStats,
    story_graph::RenderStoryGraphs,
    upload::UploadFile,
};

/// Main application state.
///
/// Holds the repositories, use cases and the auth service.
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub repos: Repositories,
    pub use_cases: UseCases,
    pub auth: AuthService,
}

/// Container for all repository ports.
pub struct Repositories {
    pub genres: Arc<dyn CatalogRepo>,
    pub modes: Arc<dyn CatalogRepo>,
    pub difficulties: Arc<dyn CatalogRepo>,
    pub scenarios: Arc<dyn ScenarioRepo>,
    pub characters: Arc<dyn CharacterRepo>,
    pub stories: Arc<dyn StoryRepo>,
    pub sessions: Arc<dyn SessionRepo>,
    pub users: Arc<dyn UserRepo>,
    pub admins: Arc<dyn AdminRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub genres: CatalogOps,
    pub modes: CatalogOps,
    pub difficulties: CatalogOps,
    pub upload: UploadFile,
    pub ingest_scenario: IngestScenario,
    pub generate_characters: GenerateCharacters,
    pub ingest_story: IngestStory,
    pub story_graphs: RenderStoryGraphs,
    pub images: EntityImages,
    pub session_reports: SessionReports,
    pub stats: ComputeStats,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        pool: SqlitePool,
        llm: Arc<dyn LlmPort>,
        image_gen: Arc<dyn ImageGenPort>,
        storage: Arc<dyn StoragePort>,
        tokens: Arc<TokenService>,
    ) -> Self {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

        let genres: Arc<dyn CatalogRepo> =
            Arc::new(SqliteCatalogRepo::new(pool.clone(), CatalogKind::Genre));
        let modes: Arc<dyn CatalogRepo> =
            Arc::new(SqliteCatalogRepo::new(pool.clone(), CatalogKind::Mode));
        let difficulties: Arc<dyn CatalogRepo> =
            Arc::new(SqliteCatalogRepo::new(pool.clone(), CatalogKind::Difficulty));
        let scenarios: Arc<dyn ScenarioRepo> = Arc::new(SqliteScenarioRepo::new(pool.clone()));
        let characters: Arc<dyn CharacterRepo> = Arc::new(SqliteCharacterRepo::new(pool.clone()));
        let stories: Arc<dyn StoryRepo> = Arc::new(SqliteStoryRepo::new(pool.clone()));
        let sessions: Arc<dyn SessionRepo> = Arc::new(SqliteSessionRepo::new(pool.clone()));
        let users: Arc<dyn UserRepo> = Arc::new(SqliteUserRepo::new(pool.clone()));
        let admins: Arc<dyn AdminRepo> = Arc::new(SqliteAdminRepo::new(pool));

        let use_cases = UseCases {
            genres: CatalogOps::new(genres.clone()),
            modes: CatalogOps::new(modes.clone()),
            difficulties: CatalogOps::new(difficulties.clone()),
            upload: UploadFile::new(storage.clone()),
            ingest_scenario: IngestScenario::new(
                storage.clone(),
                llm.clone(),
                scenarios.clone(),
            ),
            generate_characters: GenerateCharacters::new(
                llm.clone(),
                scenarios.clone(),
                characters.clone(),
            ),
            ingest_story: IngestStory::new(storage.clone(), llm.clone(), stories.clone()),
            story_graphs: RenderStoryGraphs::new(stories.clone()),
            images: EntityImages::new(
                llm,
                image_gen,
                storage,
                scenarios.clone(),
                characters.clone(),
                stories.clone(),
                clock.clone(),
            ),
            session_reports: SessionReports::new(
                sessions.clone(),
                users.clone(),
                stories.clone(),
                scenarios.clone(),
                characters.clone(),
                genres.clone(),
                difficulties.clone(),
                modes.clone(),
            ),
            stats: ComputeStats::new(sessions.clone()),
        };

        let auth = AuthService::new(admins.clone(), tokens, clock);

        let repos = Repositories {
            genres,
            modes,
            difficulties,
            scenarios,
            characters,
            stories,
            sessions,
            users,
            admins,
        };

        Self {
            repos,
            use_cases,
            auth,
        }
    }
}
