//! SQLite pool construction and schema bootstrap.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::infrastructure::ports::RepoError;

/// Open (or create) the content store database.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await
        .map_err(|e| RepoError::database("connect", e))
}

/// Ensure all content-store tables exist.
///
/// Reference entities share one shape across three tables; soft deletion is a
/// flag pair, rows are never dropped. `seq` columns preserve ingestion order
/// for moments and choices.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS genre (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            is_display INTEGER NOT NULL DEFAULT 1,
            is_deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS mode (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            is_display INTEGER NOT NULL DEFAULT 1,
            is_deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS difficulty (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            is_display INTEGER NOT NULL DEFAULT 1,
            is_deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS scenario (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL UNIQUE,
            title_en TEXT,
            description TEXT NOT NULL DEFAULT '',
            description_en TEXT,
            image_path TEXT,
            is_display INTEGER NOT NULL DEFAULT 1,
            is_deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS character (
            id TEXT PRIMARY KEY,
            scenario_id TEXT NOT NULL REFERENCES scenario(id),
            name TEXT NOT NULL,
            name_en TEXT,
            role TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            description_en TEXT,
            items_json TEXT NOT NULL DEFAULT '[]',
            ability_json TEXT NOT NULL DEFAULT '{}',
            image_path TEXT,
            is_display INTEGER NOT NULL DEFAULT 1,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            UNIQUE (scenario_id, name)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS story (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            title_en TEXT,
            description TEXT NOT NULL DEFAULT '',
            description_en TEXT,
            start_moment_id TEXT,
            image_path TEXT,
            is_display INTEGER NOT NULL DEFAULT 1,
            is_deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS moment (
            id TEXT PRIMARY KEY,
            story_id TEXT NOT NULL REFERENCES story(id),
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            image_path TEXT,
            seq INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS choice (
            id TEXT PRIMARY KEY,
            moment_id TEXT NOT NULL REFERENCES moment(id),
            action_type TEXT NOT NULL DEFAULT '',
            next_moment_id TEXT,
            seq INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS story_session (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            story_id TEXT NOT NULL,
            current_moment_id TEXT,
            progress_pct REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'in_progress',
            history_json TEXT NOT NULL DEFAULT '[]',
            start_at TEXT,
            end_at TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS play_session (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            play_mode TEXT NOT NULL,
            scenario_id TEXT,
            genre_id TEXT,
            difficulty_id TEXT,
            mode_id TEXT,
            character_id TEXT,
            choice_history_json TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'in_progress',
            started_at TEXT NOT NULL,
            ended_at TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS admin (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_superuser INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            joined_at TEXT NOT NULL,
            login_at TEXT,
            is_deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS user (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            social_type TEXT NOT NULL DEFAULT '',
            joined_at TEXT NOT NULL,
            login_at TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS token_blacklist (
            jti TEXT PRIMARY KEY,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_character_scenario ON character(scenario_id)",
        "CREATE INDEX IF NOT EXISTS idx_moment_story ON moment(story_id)",
        "CREATE INDEX IF NOT EXISTS idx_choice_moment ON choice(moment_id)",
        "CREATE INDEX IF NOT EXISTS idx_story_session_user ON story_session(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_play_session_user ON play_session(user_id)",
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("schema", e))?;
    }

    Ok(())
}

// =============================================================================
// Row codec helpers
// =============================================================================

pub(crate) fn parse_uuid(value: &str, context: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(value)
        .map_err(|e| RepoError::Serialization(format!("{context}: bad uuid {value}: {e}")))
}

pub(crate) fn parse_timestamp(value: &str, context: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepoError::Serialization(format!("{context}: bad timestamp {value}: {e}")))
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    value: &str,
    context: &str,
) -> Result<T, RepoError> {
    serde_json::from_str(value)
        .map_err(|e| RepoError::Serialization(format!("{context}: bad json: {e}")))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T, context: &str) -> Result<String, RepoError> {
    serde_json::to_string(value)
        .map_err(|e| RepoError::Serialization(format!("{context}: encode failed: {e}")))
}

/// A throwaway on-disk database with the full schema, for repository tests.
/// The TempDir guard must stay alive for the pool's lifetime.
#[cfg(test)]
pub(crate) async fn scratch_store() -> (tempfile::TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scratch.db");
    let pool = connect(path.to_str().expect("utf-8 path"))
        .await
        .expect("connect");
    ensure_schema(&pool).await.expect("schema");
    (dir, pool)
}
