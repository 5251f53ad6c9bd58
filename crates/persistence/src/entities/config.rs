//! Config entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the configs table.
#[derive(Debug, Clone, FromRow)]
pub struct ConfigEntity {
    pub namespace: String,
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
