//! One repository serving all three reference tables (genre, mode,
//! difficulty). The tables share a shape; only the table name differs.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use taleforge_domain::{CatalogEntry, CatalogKind};

use crate::infrastructure::persistence::connection::parse_uuid;
use crate::infrastructure::ports::{CatalogRepo, EntityPatch, FlagPatch, RepoError};

pub struct SqliteCatalogRepo {
    pool: SqlitePool,
    kind: CatalogKind,
}

impl SqliteCatalogRepo {
    pub fn new(pool: SqlitePool, kind: CatalogKind) -> Self {
        Self { pool, kind }
    }

    fn table(&self) -> &'static str {
        // Table names mirror CatalogKind::as_str and are never user input.
        self.kind.as_str()
    }

    fn row_to_entry(&self, row: &sqlx::sqlite::SqliteRow) -> Result<CatalogEntry, RepoError> {
        let id: String = row.get("id");
        Ok(CatalogEntry {
            id: parse_uuid(&id, self.table())?,
            name: row.get("name"),
            is_display: row.get::<i64, _>("is_display") != 0,
            is_deleted: row.get::<i64, _>("is_deleted") != 0,
        })
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<CatalogEntry>, RepoError> {
        let sql = format!(
            "SELECT id, name, is_display, is_deleted FROM {} WHERE id = ?",
            self.table()
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database(self.table(), e))?;

        row.map(|r| self.row_to_entry(&r)).transpose()
    }
}

#[async_trait]
impl CatalogRepo for SqliteCatalogRepo {
    fn kind(&self) -> CatalogKind {
        self.kind
    }

    async fn get_or_create(&self, name: &str) -> Result<(CatalogEntry, bool), RepoError> {
        let sql = format!(
            "SELECT id, name, is_display, is_deleted FROM {} WHERE name = ?",
            self.table()
        );
        let existing = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database(self.table(), e))?;

        if let Some(row) = existing {
            return Ok((self.row_to_entry(&row)?, false));
        }

        let entry = CatalogEntry::new(name);
        let sql = format!(
            "INSERT INTO {} (id, name, is_display, is_deleted) VALUES (?, ?, ?, ?)",
            self.table()
        );
        sqlx::query(&sql)
            .bind(entry.id.to_string())
            .bind(&entry.name)
            .bind(entry.is_display as i64)
            .bind(entry.is_deleted as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database(self.table(), e))?;

        Ok((entry, true))
    }

    async fn get(&self, id: Uuid) -> Result<Option<CatalogEntry>, RepoError> {
        self.fetch(id).await
    }

    async fn list_visible(&self) -> Result<Vec<CatalogEntry>, RepoError> {
        let sql = format!(
            "SELECT id, name, is_display, is_deleted FROM {} \
             WHERE is_display = 1 AND is_deleted = 0 ORDER BY name",
            self.table()
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database(self.table(), e))?;

        rows.iter().map(|r| self.row_to_entry(r)).collect()
    }

    async fn update(&self, id: Uuid, patch: &EntityPatch) -> Result<CatalogEntry, RepoError> {
        let current = self
            .fetch(id)
            .await?
            .ok_or_else(|| RepoError::not_found(self.table(), id.to_string()))?;

        let name = patch.name.clone().unwrap_or(current.name);
        let is_display = patch.is_display.unwrap_or(current.is_display);
        let is_deleted = patch.is_deleted.unwrap_or(current.is_deleted);

        let sql = format!(
            "UPDATE {} SET name = ?, is_display = ?, is_deleted = ? WHERE id = ?",
            self.table()
        );
        sqlx::query(&sql)
            .bind(&name)
            .bind(is_display as i64)
            .bind(is_deleted as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database(self.table(), e))?;

        Ok(CatalogEntry {
            id,
            name,
            is_display,
            is_deleted,
        })
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

        let sql = format!("UPDATE {} SET {}", self.table(), sets.join(", "));
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
            .map_err(|e| RepoError::database(self.table(), e))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::connection::scratch_store;

    #[tokio::test]
    async fn get_or_create_is_idempotent_on_name() {
        let (_dir, pool) = scratch_store().await;
        let repo = SqliteCatalogRepo::new(pool, CatalogKind::Genre);

        let (first, created) = repo.get_or_create("fantasy").await.expect("creates");
        assert!(created);

        let (second, created) = repo.get_or_create("fantasy").await.expect("fetches");
        assert!(!created);
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn hidden_and_deleted_rows_never_list() {
        let (_dir, pool) = scratch_store().await;
        let repo = SqliteCatalogRepo::new(pool, CatalogKind::Genre);

        let (fantasy, _) = repo.get_or_create("fantasy").await.expect("creates");
        let (horror, _) = repo.get_or_create("horror").await.expect("creates");
        let (noir, _) = repo.get_or_create("noir").await.expect("creates");

        repo.update(
            horror.id,
            &EntityPatch {
                is_display: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("hides");
        repo.update(
            noir.id,
            &EntityPatch {
                is_deleted: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("soft-deletes");

        let visible = repo.list_visible().await.expect("lists");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, fantasy.id);
    }

    #[tokio::test]
    async fn update_all_touches_exactly_the_requested_flag() {
        let (_dir, pool) = scratch_store().await;
        let repo = SqliteCatalogRepo::new(pool, CatalogKind::Mode);

        repo.get_or_create("single").await.expect("creates");
        repo.get_or_create("multi").await.expect("creates");

        let touched = repo
            .update_all(&FlagPatch {
                is_display: None,
                is_deleted: Some(true),
            })
            .await
            .expect("updates");
        assert_eq!(touched, 2);

        let (row, created) = repo.get_or_create("single").await.expect("fetches");
        assert!(!created);
        assert!(row.is_deleted);
        assert!(row.is_display);
        assert!(repo.list_visible().await.expect("lists").is_empty());
    }
}
