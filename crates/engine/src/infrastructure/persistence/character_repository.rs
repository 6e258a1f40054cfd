use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use taleforge_domain::{Character, CharacterId, ScenarioId};

use crate::infrastructure::persistence::connection::{parse_json, parse_uuid, to_json};
use crate::infrastructure::ports::{CharacterRepo, EntityPatch, FlagPatch, RepoError};

const COLUMNS: &str = "id, scenario_id, name, name_en, role, description, description_en, \
                       items_json, ability_json, image_path, is_display, is_deleted";

pub struct SqliteCharacterRepo {
    pool: SqlitePool,
}

impl SqliteCharacterRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_character(row: &sqlx::sqlite::SqliteRow) -> Result<Character, RepoError> {
    let id: String = row.get("id");
    let scenario_id: String = row.get("scenario_id");
    let items_json: String = row.get("items_json");
    let ability_json: String = row.get("ability_json");

    Ok(Character {
        id: CharacterId::from_uuid(parse_uuid(&id, "character")?),
        scenario_id: ScenarioId::from_uuid(parse_uuid(&scenario_id, "character")?),
        name: row.get("name"),
        name_en: row.get("name_en"),
        role: row.get("role"),
        description: row.get("description"),
        description_en: row.get("description_en"),
        items: parse_json(&items_json, "character items")?,
        ability: parse_json(&ability_json, "character ability")?,
        image_path: row.get("image_path"),
        is_display: row.get::<i64, _>("is_display") != 0,
        is_deleted: row.get::<i64, _>("is_deleted") != 0,
    })
}

async fn insert(pool: &SqlitePool, character: &Character) -> Result<(), RepoError> {
    sqlx::query(
        "INSERT INTO character \
         (id, scenario_id, name, name_en, role, description, description_en, \
          items_json, ability_json, image_path, is_display, is_deleted) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(character.id.to_string())
    .bind(character.scenario_id.to_string())
    .bind(&character.name)
    .bind(&character.name_en)
    .bind(&character.role)
    .bind(&character.description)
    .bind(&character.description_en)
    .bind(to_json(&character.items, "character items")?)
    .bind(to_json(&character.ability, "character ability")?)
    .bind(&character.image_path)
    .bind(character.is_display as i64)
    .bind(character.is_deleted as i64)
    .execute(pool)
    .await
    .map_err(|e| RepoError::database("character insert", e))?;

    Ok(())
}

#[async_trait]
impl CharacterRepo for SqliteCharacterRepo {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM character WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("character get", e))?;

        row.map(|r| row_to_character(&r)).transpose()
    }

    async fn get_or_create(
        &self,
        candidate: &Character,
    ) -> Result<(Character, bool), RepoError> {
        let existing = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM character WHERE scenario_id = ? AND name = ?"
        ))
        .bind(candidate.scenario_id.to_string())
        .bind(&candidate.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("character lookup", e))?;

        if let Some(row) = existing {
            return Ok((row_to_character(&row)?, false));
        }

        insert(&self.pool, candidate).await?;
        Ok((candidate.clone(), true))
    }

    async fn list_for_scenario(
        &self,
        scenario_id: ScenarioId,
    ) -> Result<Vec<Character>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM character \
             WHERE scenario_id = ? AND is_display = 1 AND is_deleted = 0 ORDER BY name"
        ))
        .bind(scenario_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("character list", e))?;

        rows.iter().map(row_to_character).collect()
    }

    async fn update(&self, id: CharacterId, patch: &EntityPatch) -> Result<Character, RepoError> {
        let mut current = self
            .get(id)
            .await?
            .ok_or_else(|| RepoError::not_found("character", id.to_string()))?;

        if let Some(name) = &patch.name {
            current.name = name.clone();
        }
        if let Some(is_display) = patch.is_display {
            current.is_display = is_display;
        }
        if let Some(is_deleted) = patch.is_deleted {
            current.is_deleted = is_deleted;
        }

        sqlx::query("UPDATE character SET name = ?, is_display = ?, is_deleted = ? WHERE id = ?")
            .bind(&current.name)
            .bind(current.is_display as i64)
            .bind(current.is_deleted as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("character update", e))?;

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

        let sql = format!("UPDATE character SET {}", sets.join(", "));
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
            .map_err(|e| RepoError::database("character update_all", e))?;

        Ok(result.rows_affected())
    }

    async fn set_image_path<'a>(
        &self,
        id: CharacterId,
        image_path: Option<&'a str>,
    ) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE character SET image_path = ? WHERE id = ?")
            .bind(image_path)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("character image", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("character", id.to_string()));
        }

        Ok(())
    }
}
