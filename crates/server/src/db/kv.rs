//! Key-value store trait definition.
//!
//! [`KvStore`] is the only persistence interface the application uses. It is
//! deliberately minimal:
//!
//! - **Keys are opaque strings**: no format is enforced
//! - **Values are JSON**: records are stored as `serde_json::Value`
//! - **One multi-key query**: [`get_by_prefix`](KvStore::get_by_prefix)
//!   emulates a table scan over a key namespace
//!
//! There are no secondary indexes and no transactions across calls, so
//! callers that check-then-write (username uniqueness, the initialization
//! gate) are not atomic.

use async_trait::async_trait;
use serde_json::Value;

use super::StoreError;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Abstract key-value store.
///
/// Implementations must be thread-safe (`Send + Sync`); the application
/// shares one instance across all requests behind an `Arc<dyn KvStore>`.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](KvStore::get) | Point lookup, `None` when absent |
/// | [`set`](KvStore::set) | Upsert a single key |
/// | [`del`](KvStore::del) | Idempotent delete |
/// | [`get_by_prefix`](KvStore::get_by_prefix) | All values under a key prefix |
/// | [`set_many`](KvStore::set_many) | Bulk upsert |
/// | [`health_check`](KvStore::health_check) | Verify backend availability |
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Retrieves the value stored at `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Stores `value` at `key`, overwriting any existing value.
    async fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Deletes `key`. Deleting an absent key is a no-op.
    async fn del(&self, key: &str) -> StoreResult<()>;

    /// Returns every value whose key starts with `prefix`.
    ///
    /// Order is unspecified and there is no pagination: the whole namespace
    /// is returned. An empty prefix matches every key.
    async fn get_by_prefix(&self, prefix: &str) -> StoreResult<Vec<Value>>;

    /// Stores many entries.
    ///
    /// The default implementation calls [`set`](KvStore::set) for each entry
    /// in order; backends may override it to write in a single round trip.
    async fn set_many(&self, entries: Vec<(String, Value)>) -> StoreResult<()> {
        for (key, value) in entries {
            self.set(&key, value).await?;
        }
        Ok(())
    }

    /// Checks that the backend is reachable.
    async fn health_check(&self) -> StoreResult<()>;
}
