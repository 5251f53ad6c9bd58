//! Config repository.
//!
//! Stores admin settings as JSON values keyed by namespace and key.

use async_trait::async_trait;
use domain::models::CONFIG_NAMESPACE;
use domain::services::{ConfigLookup, DirectoryError};
use serde_json::Value;
use sqlx::PgPool;

use super::db_error;
use crate::entities::ConfigEntity;
use crate::metrics::QueryTimer;

/// PostgreSQL-backed [`ConfigLookup`] for one namespace.
#[derive(Clone)]
pub struct ConfigRepository {
    pool: PgPool,
    namespace: String,
}

impl ConfigRepository {
    /// Repository over the `crowi` namespace.
    pub fn new(pool: PgPool) -> Self {
        Self::with_namespace(pool, CONFIG_NAMESPACE)
    }

    pub fn with_namespace(pool: PgPool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl ConfigLookup for ConfigRepository {
    async fn get_config(&self, key: &str) -> Result<Option<Value>, DirectoryError> {
        let timer = QueryTimer::new("get_config");
        let result = sqlx::query_as::<_, ConfigEntity>(
            r#"
            SELECT namespace, key, value, updated_at
            FROM configs
            WHERE namespace = $1 AND key = $2
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(db_error)?.map(|entity| entity.value))
    }

    async fn update_configs(&self, entries: Vec<(String, Value)>) -> Result<(), DirectoryError> {
        let timer = QueryTimer::new("update_configs");
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO configs (namespace, key, value, updated_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (namespace, key)
                DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                "#,
            )
            .bind(&self.namespace)
            .bind(&key)
            .bind(&value)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }
        tx.commit().await.map_err(db_error)?;
        timer.record();

        Ok(())
    }
}
