//! Read-side session store. Sessions are written by the gameplay services;
//! this backend only queries them for reporting and statistics.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use taleforge_domain::{
    MomentId, PlayMode, PlaySession, SessionId, SessionStatus, StoryId, StorySession, UserId,
};

use crate::infrastructure::persistence::connection::{parse_json, parse_timestamp, parse_uuid};
use crate::infrastructure::ports::{RepoError, SessionRepo, StatDimension, TopSelection};

pub struct SqliteSessionRepo {
    pool: SqlitePool,
}

impl SqliteSessionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_status(value: &str) -> Result<SessionStatus, RepoError> {
    SessionStatus::parse(value)
        .ok_or_else(|| RepoError::Serialization(format!("unknown session status: {value}")))
}

fn row_to_story_session(row: &sqlx::sqlite::SqliteRow) -> Result<StorySession, RepoError> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let story_id: String = row.get("story_id");
    let current: Option<String> = row.get("current_moment_id");
    let status: String = row.get("status");
    let history_json: String = row.get("history_json");
    let start_at: Option<String> = row.get("start_at");
    let end_at: Option<String> = row.get("end_at");
    let updated_at: String = row.get("updated_at");

    Ok(StorySession {
        id: SessionId::from_uuid(parse_uuid(&id, "story_session")?),
        user_id: UserId::from_uuid(parse_uuid(&user_id, "story_session")?),
        story_id: StoryId::from_uuid(parse_uuid(&story_id, "story_session")?),
        current_moment_id: current
            .map(|s| parse_uuid(&s, "story_session moment").map(MomentId::from_uuid))
            .transpose()?,
        progress_pct: row.get("progress_pct"),
        status: parse_status(&status)?,
        history: parse_json(&history_json, "story_session history")?,
        start_at: start_at
            .map(|s| parse_timestamp(&s, "story_session start"))
            .transpose()?,
        end_at: end_at
            .map(|s| parse_timestamp(&s, "story_session end"))
            .transpose()?,
        updated_at: parse_timestamp(&updated_at, "story_session updated")?,
    })
}

fn parse_play_mode(value: &str) -> Result<PlayMode, RepoError> {
    match value {
        "single" => Ok(PlayMode::Single),
        "multi" => Ok(PlayMode::Multi),
        other => Err(RepoError::Serialization(format!(
            "unknown play mode: {other}"
        ))),
    }
}

fn optional_id<T>(
    value: Option<String>,
    context: &str,
    wrap: fn(uuid::Uuid) -> T,
) -> Result<Option<T>, RepoError> {
    value
        .map(|s| parse_uuid(&s, context).map(wrap))
        .transpose()
}

fn row_to_play_session(row: &sqlx::sqlite::SqliteRow) -> Result<PlaySession, RepoError> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let play_mode: String = row.get("play_mode");
    let status: String = row.get("status");
    let choice_history_json: String = row.get("choice_history_json");
    let started_at: String = row.get("started_at");
    let ended_at: Option<String> = row.get("ended_at");

    Ok(PlaySession {
        id: SessionId::from_uuid(parse_uuid(&id, "play_session")?),
        user_id: UserId::from_uuid(parse_uuid(&user_id, "play_session")?),
        play_mode: parse_play_mode(&play_mode)?,
        scenario_id: optional_id(
            row.get("scenario_id"),
            "play_session scenario",
            taleforge_domain::ScenarioId::from_uuid,
        )?,
        genre_id: optional_id(
            row.get("genre_id"),
            "play_session genre",
            taleforge_domain::GenreId::from_uuid,
        )?,
        difficulty_id: optional_id(
            row.get("difficulty_id"),
            "play_session difficulty",
            taleforge_domain::DifficultyId::from_uuid,
        )?,
        mode_id: optional_id(
            row.get("mode_id"),
            "play_session mode",
            taleforge_domain::ModeId::from_uuid,
        )?,
        character_id: optional_id(
            row.get("character_id"),
            "play_session character",
            taleforge_domain::CharacterId::from_uuid,
        )?,
        choice_history: parse_json(&choice_history_json, "play_session history")?,
        status: parse_status(&status)?,
        started_at: parse_timestamp(&started_at, "play_session start")?,
        ended_at: ended_at
            .map(|s| parse_timestamp(&s, "play_session end"))
            .transpose()?,
    })
}

/// `(session column, target table, target name column)` per dimension.
fn dimension_join(dimension: StatDimension) -> (&'static str, &'static str, &'static str) {
    match dimension {
        StatDimension::Scenario => ("scenario_id", "scenario", "title"),
        StatDimension::Genre => ("genre_id", "genre", "name"),
        StatDimension::Difficulty => ("difficulty_id", "difficulty", "name"),
        StatDimension::Character => ("character_id", "character", "name"),
    }
}

#[async_trait]
impl SessionRepo for SqliteSessionRepo {
    async fn story_sessions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<StorySession>, RepoError> {
        let rows = sqlx::query(
            "SELECT id, user_id, story_id, current_moment_id, progress_pct, status, \
                    history_json, start_at, end_at, updated_at \
             FROM story_session WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("story_session list", e))?;

        rows.iter().map(row_to_story_session).collect()
    }

    async fn play_sessions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PlaySession>, RepoError> {
        let rows = sqlx::query(
            "SELECT id, user_id, play_mode, scenario_id, genre_id, difficulty_id, mode_id, \
                    character_id, choice_history_json, status, started_at, ended_at \
             FROM play_session WHERE user_id = ? ORDER BY started_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("play_session list", e))?;

        rows.iter().map(row_to_play_session).collect()
    }

    async fn top_selection(
        &self,
        mode: PlayMode,
        dimension: StatDimension,
    ) -> Result<Option<TopSelection>, RepoError> {
        let (column, table, name_column) = dimension_join(dimension);

        // Sessions referencing hidden or soft-deleted targets are excluded
        // before ranking, not merely masked in the response.
        let sql = format!(
            "SELECT t.id AS id, t.{name_column} AS name, COUNT(*) AS cnt \
             FROM play_session s JOIN {table} t ON t.id = s.{column} \
             WHERE s.play_mode = ? AND t.is_display = 1 AND t.is_deleted = 0 \
             GROUP BY t.id, t.{name_column} \
             ORDER BY cnt DESC, t.{name_column} \
             LIMIT 1"
        );

        let row = sqlx::query(&sql)
            .bind(mode.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("top_selection", e))?;

        row.map(|r| {
            let id: String = r.get("id");
            Ok(TopSelection {
                id: parse_uuid(&id, "top_selection")?,
                name: r.get("name"),
                count: r.get("cnt"),
            })
        })
        .transpose()
    }
}
