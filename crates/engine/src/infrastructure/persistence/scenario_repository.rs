use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use taleforge_domain::{Scenario, ScenarioId};

use crate::infrastructure::persistence::connection::parse_uuid;
use crate::infrastructure::ports::{EntityPatch, FlagPatch, RepoError, ScenarioRepo};

const COLUMNS: &str =
    "id, title, title_en, description, description_en, image_path, is_display, is_deleted";

pub struct SqliteScenarioRepo {
    pool: SqlitePool,
}

impl SqliteScenarioRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_scenario(row: &sqlx::sqlite::SqliteRow) -> Result<Scenario, RepoError> {
    let id: String = row.get("id");
    Ok(Scenario {
        id: ScenarioId::from_uuid(parse_uuid(&id, "scenario")?),
        title: row.get("title"),
        title_en: row.get("title_en"),
        description: row.get("description"),
        description_en: row.get("description_en"),
        image_path: row.get("image_path"),
        is_display: row.get::<i64, _>("is_display") != 0,
        is_deleted: row.get::<i64, _>("is_deleted") != 0,
    })
}

async fn insert(pool: &SqlitePool, scenario: &Scenario) -> Result<(), RepoError> {
    sqlx::query(
        "INSERT INTO scenario \
         (id, title, title_en, description, description_en, image_path, is_display, is_deleted) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(scenario.id.to_string())
    .bind(&scenario.title)
    .bind(&scenario.title_en)
    .bind(&scenario.description)
    .bind(&scenario.description_en)
    .bind(&scenario.image_path)
    .bind(scenario.is_display as i64)
    .bind(scenario.is_deleted as i64)
    .execute(pool)
    .await
    .map_err(|e| RepoError::database("scenario insert", e))?;

    Ok(())
}

#[async_trait]
impl ScenarioRepo for SqliteScenarioRepo {
    async fn get(&self, id: ScenarioId) -> Result<Option<Scenario>, RepoError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM scenario WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("scenario get", e))?;

        row.map(|r| row_to_scenario(&r)).transpose()
    }

    async fn get_or_create(
        &self,
        title: &str,
        description: &str,
    ) -> Result<(Scenario, bool), RepoError> {
        let existing = sqlx::query(&format!("SELECT {COLUMNS} FROM scenario WHERE title = ?"))
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("scenario lookup", e))?;

        if let Some(row) = existing {
            return Ok((row_to_scenario(&row)?, false));
        }

        let scenario = Scenario::new(title, description);
        insert(&self.pool, &scenario).await?;
        Ok((scenario, true))
    }

    async fn list_visible(&self) -> Result<Vec<Scenario>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM scenario \
             WHERE is_display = 1 AND is_deleted = 0 ORDER BY title"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("scenario list", e))?;

        rows.iter().map(row_to_scenario).collect()
    }

    async fn update(&self, id: ScenarioId, patch: &EntityPatch) -> Result<Scenario, RepoError> {
        let mut current = self
            .get(id)
            .await?
            .ok_or_else(|| RepoError::not_found("scenario", id.to_string()))?;

        if let Some(title) = &patch.name {
            current.title = title.clone();
        }
        if let Some(is_display) = patch.is_display {
            current.is_display = is_display;
        }
        if let Some(is_deleted) = patch.is_deleted {
            current.is_deleted = is_deleted;
        }

        sqlx::query("UPDATE scenario SET title = ?, is_display = ?, is_deleted = ? WHERE id = ?")
            .bind(&current.title)
            .bind(current.is_display as i64)
            .bind(current.is_deleted as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("scenario update", e))?;

        Ok(current)
    }

    async fn update_all(&self, patch: &FlagPatch) -> Result<u64, RepoError> {
        let mut sets = Vec::new();
        if patch.is_display.is_some() {
            sets.push("is_display = ?");
        }
        if patch.is_deleted.is_some() {
            sets.push("is_deleted = ?");
        }
        if sets.is_empty() {
            return Ok(0);
        }

        let sql = format!("UPDATE scenario SET {}", sets.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(is_display) = patch.is_display {
            query = query.bind(is_display as i64);
        }
        if let Some(is_deleted) = patch.is_deleted {
            query = query.bind(is_deleted as i64);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("scenario update_all", e))?;

        Ok(result.rows_affected())
    }

    async fn set_image_path<'a>(
        &self,
        id: ScenarioId,
        image_path: Option<&'a str>,
    ) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE scenario SET image_path = ? WHERE id = ?")
            .bind(image_path)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("scenario image", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("scenario", id.to_string()));
        }

        Ok(())
    }
}
