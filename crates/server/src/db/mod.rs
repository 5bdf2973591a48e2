//! Persistence over a generic key-value store.
//!
//! # Key Layout
//!
//! Every record is a JSON value under a colon-namespaced string key:
//!
//! - `user:<provider id>` - user profiles ([`UserRepository`])
//! - `product:<generated id>` - products ([`ProductRepository`])
//!
//! Namespacing is a convention of the repositories; the [`KvStore`] itself
//! treats keys as opaque strings. Listing a namespace is a full prefix scan.
//!
//! # Backends
//!
//! - [`MemoryStore`] - in-process `BTreeMap`, for tests and local development
//! - [`PgStore`] - `PostgreSQL` `kv_store` table. Migrations live in
//!   `crates/server/migrations/` and are run via:
//!
//! ```bash
//! cargo run -p lpg-cli -- migrate
//! ```

pub mod kv;
pub mod memory;
pub mod postgres;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use kv::{KvStore, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors raised by a [`KvStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A value could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored value does not decode into the expected record.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Decode a stored JSON value into a record, reporting the offending key.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    key: &str,
    value: serde_json::Value,
) -> Result<T, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid record at {key}: {e}")))
}
