use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use taleforge_domain::{Choice, ChoiceId, Moment, MomentId, Story, StoryId};

use crate::infrastructure::persistence::connection::parse_uuid;
use crate::infrastructure::ports::{EntityPatch, FlagPatch, RepoError, StoryRepo};

const STORY_COLUMNS: &str = "id, title, title_en, description, description_en, \
                             start_moment_id, image_path, is_display, is_deleted";
const MOMENT_COLUMNS: &str = "id, story_id, title, description, image_path";
const CHOICE_COLUMNS: &str = "id, moment_id, action_type, next_moment_id";

pub struct SqliteStoryRepo {
    pool: SqlitePool,
}

impl SqliteStoryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_story(row: &sqlx::sqlite::SqliteRow) -> Result<Story, RepoError> {
    let id: String = row.get("id");
    let start: Option<String> = row.get("start_moment_id");

    Ok(Story {
        id: StoryId::from_uuid(parse_uuid(&id, "story")?),
        title: row.get("title"),
        title_en: row.get("title_en"),
        description: row.get("description"),
        description_en: row.get("description_en"),
        start_moment_id: start
            .map(|s| parse_uuid(&s, "story start").map(MomentId::from_uuid))
            .transpose()?,
        image_path: row.get("image_path"),
        is_display: row.get::<i64, _>("is_display") != 0,
        is_deleted: row.get::<i64, _>("is_deleted") != 0,
    })
}

fn row_to_moment(row: &sqlx::sqlite::SqliteRow) -> Result<Moment, RepoError> {
    let id: String = row.get("id");
    let story_id: String = row.get("story_id");

    Ok(Moment {
        id: MomentId::from_uuid(parse_uuid(&id, "moment")?),
        story_id: StoryId::from_uuid(parse_uuid(&story_id, "moment")?),
        title: row.get("title"),
        description: row.get("description"),
        image_path: row.get("image_path"),
    })
}

fn row_to_choice(row: &sqlx::sqlite::SqliteRow) -> Result<Choice, RepoError> {
    let id: String = row.get("id");
    let moment_id: String = row.get("moment_id");
    let next: Option<String> = row.get("next_moment_id");

    Ok(Choice {
        id: ChoiceId::from_uuid(parse_uuid(&id, "choice")?),
        moment_id: MomentId::from_uuid(parse_uuid(&moment_id, "choice")?),
        action_type: row.get("action_type"),
        next_moment_id: next
            .map(|s| parse_uuid(&s, "choice next").map(MomentId::from_uuid))
            .transpose()?,
    })
}

#[async_trait]
impl StoryRepo for SqliteStoryRepo {
    async fn get(&self, id: StoryId) -> Result<Option<Story>, RepoError> {
        let row = sqlx::query(&format!("SELECT {STORY_COLUMNS} FROM story WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("story get", e))?;

        row.map(|r| row_to_story(&r)).transpose()
    }

    async fn create_graph(
        &self,
        story: &Story,
        moments: &[Moment],
        choices: &[Choice],
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("story graph begin", e))?;

        sqlx::query(
            "INSERT INTO story \
             (id, title, title_en, description, description_en, start_moment_id, \
              image_path, is_display, is_deleted) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(story.id.to_string())
        .bind(&story.title)
        .bind(&story.title_en)
        .bind(&story.description)
        .bind(&story.description_en)
        .bind(story.start_moment_id.map(|m| m.to_string()))
        .bind(&story.image_path)
        .bind(story.is_display as i64)
        .bind(story.is_deleted as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("story insert", e))?;

        for (seq, moment) in moments.iter().enumerate() {
            sqlx::query(
                "INSERT INTO moment (id, story_id, title, description, image_path, seq) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(moment.id.to_string())
            .bind(moment.story_id.to_string())
            .bind(&moment.title)
            .bind(&moment.description)
            .bind(&moment.image_path)
            .bind(seq as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("moment insert", e))?;
        }

        for (seq, choice) in choices.iter().enumerate() {
            sqlx::query(
                "INSERT INTO choice (id, moment_id, action_type, next_moment_id, seq) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(choice.id.to_string())
            .bind(choice.moment_id.to_string())
            .bind(&choice.action_type)
            .bind(choice.next_moment_id.map(|m| m.to_string()))
            .bind(seq as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("choice insert", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("story graph commit", e))
    }

    async fn list_visible(&self) -> Result<Vec<Story>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM story \
             WHERE is_display = 1 AND is_deleted = 0 ORDER BY title"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("story list", e))?;

        rows.iter().map(row_to_story).collect()
    }

    async fn moments_for_story(&self, story_id: StoryId) -> Result<Vec<Moment>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {MOMENT_COLUMNS} FROM moment WHERE story_id = ? ORDER BY seq"
        ))
        .bind(story_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("moment list", e))?;

        rows.iter().map(row_to_moment).collect()
    }

    async fn choices_for_story(&self, story_id: StoryId) -> Result<Vec<Choice>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT c.id, c.moment_id, c.action_type, c.next_moment_id \
             FROM choice c JOIN moment m ON m.id = c.moment_id \
             WHERE m.story_id = ? ORDER BY c.seq"
        ))
        .bind(story_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("choice list", e))?;

        rows.iter().map(row_to_choice).collect()
    }

    async fn get_moment(&self, id: MomentId) -> Result<Option<Moment>, RepoError> {
        let row = sqlx::query(&format!("SELECT {MOMENT_COLUMNS} FROM moment WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("moment get", e))?;

        row.map(|r| row_to_moment(&r)).transpose()
    }

    async fn choices_for_moment(&self, moment_id: MomentId) -> Result<Vec<Choice>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {CHOICE_COLUMNS} FROM choice WHERE moment_id = ? ORDER BY seq"
        ))
        .bind(moment_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("choice list", e))?;

        rows.iter().map(row_to_choice).collect()
    }

    async fn update(&self, id: StoryId, patch: &EntityPatch) -> Result<Story, RepoError> {
        let mut current = self
            .get(id)
            .await?
            .ok_or_else(|| RepoError::not_found("story", id.to_string()))?;

        if let Some(title) = &patch.name {
            current.title = title.clone();
        }
        if let Some(is_display) = patch.is_display {
            current.is_display = is_display;
        }
        if let Some(is_deleted) = patch.is_deleted {
            current.is_deleted = is_deleted;
        }

        sqlx::query("UPDATE story SET title = ?, is_display = ?, is_deleted = ? WHERE id = ?")
            .bind(&current.title)
            .bind(current.is_display as i64)
            .bind(current.is_deleted as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("story update", e))?;

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

        let sql = format!("UPDATE story SET {}", sets.join(", "));
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
            .map_err(|e| RepoError::database("story update_all", e))?;

        Ok(result.rows_affected())
    }

    async fn set_image_path<'a>(
        &self,
        id: StoryId,
        image_path: Option<&'a str>,
    ) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE story SET image_path = ? WHERE id = ?")
            .bind(image_path)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("story image", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("story", id.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::connection::scratch_store;

    #[tokio::test]
    async fn graph_round_trips_in_ingestion_order() {
        let (_dir, pool) = scratch_store().await;
        let repo = SqliteStoryRepo::new(pool);

        let mut story = Story::new("The Fox", "a fox tale");
        let opening = Moment::new(story.id, "Opening", "it begins");
        let forest = Moment::new(story.id, "Forest", "deep woods");
        let ending = Moment::new(story.id, "Ending", "it ends");
        story.start_moment_id = Some(opening.id);

        let choices = vec![
            Choice::new(opening.id, "NEUTRAL", Some(forest.id)),
            Choice::new(forest.id, "GOOD", Some(ending.id)),
            Choice::new(forest.id, "BAD", None),
        ];

        repo.create_graph(
            &story,
            &[opening.clone(), forest.clone(), ending.clone()],
            &choices,
        )
        .await
        .expect("persists");

        let stored = repo.get(story.id).await.expect("queries").expect("exists");
        assert_eq!(stored.start_moment_id, Some(opening.id));

        let moments = repo.moments_for_story(story.id).await.expect("lists");
        let ids: Vec<_> = moments.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![opening.id, forest.id, ending.id]);

        let forest_choices = repo.choices_for_moment(forest.id).await.expect("lists");
        assert_eq!(forest_choices.len(), 2);
        assert_eq!(forest_choices[0].action_type, "GOOD");

        // Zero outgoing choices marks the ending structurally.
        assert!(repo
            .choices_for_moment(ending.id)
            .await
            .expect("lists")
            .is_empty());
    }

    #[tokio::test]
    async fn mid_batch_failure_leaves_no_partial_graph() {
        let (_dir, pool) = scratch_store().await;
        let repo = SqliteStoryRepo::new(pool.clone());

        let story = Story::new("The Fox", "a fox tale");
        let opening = Moment::new(story.id, "Opening", "it begins");
        // Same primary key twice makes the second moment insert fail.
        let duplicate = opening.clone();
        let choice = Choice::new(opening.id, "NEUTRAL", None);

        let result = repo
            .create_graph(&story, &[opening, duplicate], &[choice])
            .await;
        assert!(result.is_err());

        assert!(repo.get(story.id).await.expect("queries").is_none());
        let moments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM moment")
            .fetch_one(&pool)
            .await
            .expect("counts");
        assert_eq!(moments, 0);
        let choices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM choice")
            .fetch_one(&pool)
            .await
            .expect("counts");
        assert_eq!(choices, 0);
    }
}
