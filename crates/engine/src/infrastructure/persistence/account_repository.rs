//! Admin and player account stores, plus the refresh-token blacklist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use taleforge_domain::{Admin, AdminId, User, UserId};

use crate::infrastructure::persistence::connection::{parse_timestamp, parse_uuid};
use crate::infrastructure::ports::{AdminRepo, EntityPatch, FlagPatch, RepoError, UserRepo};

pub struct SqliteAdminRepo {
    pool: SqlitePool,
}

impl SqliteAdminRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_admin(row: &sqlx::sqlite::SqliteRow) -> Result<Admin, RepoError> {
    let id: String = row.get("id");
    let joined_at: String = row.get("joined_at");
    let login_at: Option<String> = row.get("login_at");

    Ok(Admin {
        id: AdminId::from_uuid(parse_uuid(&id, "admin")?),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_superuser: row.get::<i64, _>("is_superuser") != 0,
        is_active: row.get::<i64, _>("is_active") != 0,
        joined_at: parse_timestamp(&joined_at, "admin joined")?,
        login_at: login_at
            .map(|s| parse_timestamp(&s, "admin login"))
            .transpose()?,
        is_deleted: row.get::<i64, _>("is_deleted") != 0,
    })
}

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, is_superuser, is_active, \
                             joined_at, login_at, is_deleted";

#[async_trait]
impl AdminRepo for SqliteAdminRepo {
    async fn get(&self, id: AdminId) -> Result<Option<Admin>, RepoError> {
        let row = sqlx::query(&format!("SELECT {ADMIN_COLUMNS} FROM admin WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("admin get", e))?;

        row.map(|r| row_to_admin(&r)).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Admin>, RepoError> {
        let row = sqlx::query(&format!("SELECT {ADMIN_COLUMNS} FROM admin WHERE name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("admin lookup", e))?;

        row.map(|r| row_to_admin(&r)).transpose()
    }

    async fn create(&self, admin: &Admin) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO admin \
             (id, name, email, password_hash, is_superuser, is_active, joined_at, login_at, \
              is_deleted) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(admin.id.to_string())
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.is_superuser as i64)
        .bind(admin.is_active as i64)
        .bind(admin.joined_at.to_rfc3339())
        .bind(admin.login_at.map(|t| t.to_rfc3339()))
        .bind(admin.is_deleted as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("admin insert", e))?;

        Ok(())
    }

    async fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<(), RepoError> {
        sqlx::query("UPDATE admin SET login_at = ? WHERE id = ?")
            .bind(at.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("admin login", e))?;

        Ok(())
    }

    async fn blacklist_token(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        // Re-blacklisting the same token on a repeated logout is a no-op.
        sqlx::query(
            "INSERT OR IGNORE INTO token_blacklist (jti, expires_at, created_at) \
             VALUES (?, ?, ?)",
        )
        .bind(jti)
        .bind(expires_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("token blacklist", e))?;

        Ok(())
    }

    async fn is_token_blacklisted(&self, jti: &str) -> Result<bool, RepoError> {
        let row = sqlx::query("SELECT jti FROM token_blacklist WHERE jti = ?")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("token blacklist check", e))?;

        Ok(row.is_some())
    }
}

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, name, email, social_type, joined_at, login_at, is_active, is_deleted";

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepoError> {
    let id: String = row.get("id");
    let joined_at: String = row.get("joined_at");
    let login_at: Option<String> = row.get("login_at");

    Ok(User {
        id: UserId::from_uuid(parse_uuid(&id, "user")?),
        name: row.get("name"),
        email: row.get("email"),
        social_type: row.get("social_type"),
        joined_at: parse_timestamp(&joined_at, "user joined")?,
        login_at: login_at
            .map(|s| parse_timestamp(&s, "user login"))
            .transpose()?,
        is_active: row.get::<i64, _>("is_active") != 0,
        is_deleted: row.get::<i64, _>("is_deleted") != 0,
    })
}

#[async_trait]
impl UserRepo for SqliteUserRepo {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("user get", e))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn list_visible(&self) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM user \
             WHERE is_active = 1 AND is_deleted = 0 ORDER BY joined_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("user list", e))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn update(&self, id: UserId, patch: &EntityPatch) -> Result<User, RepoError> {
        let mut current = self
            .get(id)
            .await?
            .ok_or_else(|| RepoError::not_found("user", id.to_string()))?;

        if let Some(name) = &patch.name {
            current.name = name.clone();
        }
        if let Some(is_display) = patch.is_display {
            // Users carry is_active instead of is_display.
            current.is_active = is_display;
        }
        if let Some(is_deleted) = patch.is_deleted {
            current.is_deleted = is_deleted;
        }

        sqlx::query("UPDATE user SET name = ?, is_active = ?, is_deleted = ? WHERE id = ?")
            .bind(&current.name)
            .bind(current.is_active as i64)
            .bind(current.is_deleted as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("user update", e))?;

        Ok(current)
    }

    async fn update_all(&self, patch: &FlagPatch) -> Result<u64, RepoError> {
        let mut sets = Vec::new();
        if patch.is_display.is_some() {
            sets.push("is_active = ?");
        }
        if patch.is_deleted.is_some() {
            sets.push("is_deleted = ?");
        }
        if sets.is_empty() {
            return Ok(0);
        }

        let sql = format!("UPDATE user SET {}", sets.join(", "));
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
            .map_err(|e| RepoError::database("user update_all", e))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::connection::scratch_store;

    async fn seed_user(pool: &SqlitePool, name: &str) {
        sqlx::query("INSERT INTO user (id, name, email, joined_at) VALUES (?, ?, ?, ?)")
            .bind(UserId::new().to_string())
            .bind(name)
            .bind(format!("{name}@example.com"))
            .bind(Utc::now().to_rfc3339())
            .execute(pool)
            .await
            .expect("seeds");
    }

    #[tokio::test]
    async fn deactivated_and_deleted_users_never_list() {
        let (_dir, pool) = scratch_store().await;
        let repo = SqliteUserRepo::new(pool.clone());

        for name in ["ada", "brin", "cody"] {
            seed_user(&pool, name).await;
        }

        let listed = repo.list_visible().await.expect("lists");
        assert_eq!(listed.len(), 3);

        // The display flag maps onto is_active for users and must hide them.
        repo.update(
            listed[0].id,
            &EntityPatch {
                is_display: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("deactivates");
        repo.update(
            listed[1].id,
            &EntityPatch {
                is_deleted: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("soft-deletes");

        let remaining = repo.list_visible().await.expect("lists");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, listed[2].id);
    }
}
