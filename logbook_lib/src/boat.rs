use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::prelude::FromRow;

#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boat {
    pub boat_id: i64,
    pub user_id: i64,
    pub name: String,
    pub model: String,
}

/// Caller-supplied boat fields, ids are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoatDraft {
    pub name: String,
    #[serde(default)]
    pub model: String,
}
