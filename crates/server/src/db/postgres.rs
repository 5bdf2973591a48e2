//! `PostgreSQL`-backed key-value store.
//!
//! Entries live in a single table created by
//! `migrations/20250101000000_create_kv_store.sql`:
//!
//! ```sql
//! CREATE TABLE kv_store (key TEXT PRIMARY KEY, value JSONB NOT NULL);
//! ```
//!
//! Prefix scans use `starts_with(key, $1)`, so `%` and `_` in a prefix are
//! matched literally.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use super::kv::{KvStore, StoreResult};

/// [`KvStore`] over a `PostgreSQL` table.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl KvStore for PgStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let row: Option<(Json<Value>,)> =
            sqlx::query_as("SELECT value FROM kv_store WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(value),)| value))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO kv_store (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            ",
        )
        .bind(key)
        .bind(Json(value))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn del(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_prefix(&self, prefix: &str) -> StoreResult<Vec<Value>> {
        let rows: Vec<(Json<Value>,)> =
            sqlx::query_as("SELECT value FROM kv_store WHERE starts_with(key, $1)")
                .bind(prefix)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(Json(value),)| value).collect())
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn set_many(&self, entries: Vec<(String, Value)>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                r"
                INSERT INTO kv_store (key, value)
                VALUES ($1, $2)
                ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
                ",
            )
            .bind(key)
            .bind(Json(value))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
