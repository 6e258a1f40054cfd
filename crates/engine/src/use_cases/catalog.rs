//! Catalog CRUD - genres, modes and difficulties share one flow.

use std::sync::Arc;

use taleforge_domain::CatalogEntry;
use uuid::Uuid;

use crate::infrastructure::ports::{CatalogRepo, EntityPatch, FlagPatch, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    #[error("{0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl CrudError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Reject a single-row patch that would change nothing.
pub fn require_fields(patch: &EntityPatch) -> Result<(), CrudError> {
    if patch.is_empty() {
        return Err(CrudError::Validation(
            "at least one field to update is required".to_string(),
        ));
    }
    Ok(())
}

/// Reject a bulk patch that would change nothing.
pub fn require_flags(patch: &FlagPatch) -> Result<(), CrudError> {
    if patch.is_empty() {
        return Err(CrudError::Validation(
            "at least one flag to update is required".to_string(),
        ));
    }
    Ok(())
}

/// Outcome of a get-or-create, so the API layer can pick 200 vs 201.
#[derive(Debug)]
pub struct Created<T> {
    pub row: T,
    pub created: bool,
}

pub struct CatalogOps {
    repo: Arc<dyn CatalogRepo>,
}

impl CatalogOps {
    pub fn new(repo: Arc<dyn CatalogRepo>) -> Self {
        Self { repo }
    }

    pub async fn get_or_create(&self, name: &str) -> Result<Created<CatalogEntry>, CrudError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CrudError::Validation("a name is required".to_string()));
        }

        let (row, created) = self.repo.get_or_create(name).await?;
        Ok(Created { row, created })
    }

    pub async fn list(&self) -> Result<Vec<CatalogEntry>, CrudError> {
        Ok(self.repo.list_visible().await?)
    }

    pub async fn update(&self, id: Uuid, patch: &EntityPatch) -> Result<CatalogEntry, CrudError> {
        require_fields(patch)?;

        self.repo.update(id, patch).await.map_err(|e| {
            if e.is_not_found() {
                CrudError::not_found(self.repo.kind().as_str(), id.to_string())
            } else {
                e.into()
            }
        })
    }

    pub async fn update_all(&self, patch: &FlagPatch) -> Result<u64, CrudError> {
        require_flags(patch)?;
        Ok(self.repo.update_all(patch).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockCatalogRepo;
    use taleforge_domain::CatalogKind;

    #[tokio::test]
    async fn get_or_create_reports_creation() {
        let mut repo = MockCatalogRepo::new();
        repo.expect_get_or_create()
            .withf(|name| name == "fantasy")
            .returning(|name| Ok((CatalogEntry::new(name), true)));

        let ops = CatalogOps::new(Arc::new(repo));
        let created = ops.get_or_create("fantasy").await.expect("creatable");

        assert!(created.created);
        assert_eq!(created.row.name, "fantasy");
    }

    #[tokio::test]
    async fn get_or_create_trims_and_rejects_blank_names() {
        let mut repo = MockCatalogRepo::new();
        repo.expect_get_or_create()
            .withf(|name| name == "horror")
            .returning(|name| Ok((CatalogEntry::new(name), false)));

        let ops = CatalogOps::new(Arc::new(repo));

        let existing = ops.get_or_create("  horror  ").await.expect("creatable");
        assert!(!existing.created);

        let result = ops.get_or_create("   ").await;
        assert!(matches!(result, Err(CrudError::Validation(_))));
    }

    #[tokio::test]
    async fn empty_patch_is_rejected_before_the_repo_is_touched() {
        let repo = MockCatalogRepo::new();
        let ops = CatalogOps::new(Arc::new(repo));

        let result = ops.update(Uuid::new_v4(), &EntityPatch::default()).await;
        assert!(matches!(result, Err(CrudError::Validation(_))));
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let mut repo = MockCatalogRepo::new();
        repo.expect_kind().return_const(CatalogKind::Genre);
        repo.expect_update()
            .returning(|id, _| Err(RepoError::not_found("genre", id.to_string())));

        let ops = CatalogOps::new(Arc::new(repo));
        let patch = EntityPatch {
            name: Some("renamed".to_string()),
            ..Default::default()
        };

        let result = ops.update(Uuid::new_v4(), &patch).await;
        assert!(matches!(result, Err(CrudError::NotFound { .. })));
    }
}
