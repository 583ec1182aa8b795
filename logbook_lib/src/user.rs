use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::prelude::FromRow;

#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: i64,
    pub name: String,
    /// Opaque bearer token, hex encoded. Never included in trip or session
    /// responses.
    pub api_token: String,
    pub joined_at: DateTime<Utc>,
}
