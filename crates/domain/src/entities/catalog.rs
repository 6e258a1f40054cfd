//! Catalog reference entities - Genre, Mode and Difficulty share one shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reference-data row keyed by a unique name.
///
/// Genres, modes and difficulties are created via admin CRUD or AI ingestion,
/// read by gameplay clients and soft-deleted via the flag pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
    pub is_display: bool,
    pub is_deleted: bool,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_display: true,
            is_deleted: false,
        }
    }
}

/// Which catalog table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Genre,
    Mode,
    Difficulty,
}

impl CatalogKind {
    /// Stable table / entity name used in persistence and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Genre => "genre",
            Self::Mode => "mode",
            Self::Difficulty => "difficulty",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
