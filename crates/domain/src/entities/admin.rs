//! Admin account entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AdminId;

/// A backoffice operator. Password hashes never leave the persistence layer
/// through serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: AdminId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    pub login_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

impl Admin {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AdminId::new(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            is_superuser: false,
            is_active: true,
            joined_at,
            login_at: None,
            is_deleted: false,
        }
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }
}
