//! SQLite-backed repository implementations.

pub mod account_repository;
pub mod catalog_repository;
pub mod character_repository;
pub mod connection;
pub mod scenario_repository;
pub mod session_repository;
pub mod story_repository;

pub use account_repository::{SqliteAdminRepo, SqliteUserRepo};
pub use catalog_repository::SqliteCatalogRepo;
pub use character_repository::SqliteCharacterRepo;
pub use connection::{connect, ensure_schema};
pub use scenario_repository::SqliteScenarioRepo;
pub use session_repository::SqliteSessionRepo;
pub use story_repository::SqliteStoryRepo;
