//! Player account entity, read-only from the admin side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub social_type: String,
    pub joined_at: DateTime<Utc>,
    pub login_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_deleted: bool,
}
