//! In-memory key-value store.
//!
//! [`MemoryStore`] keeps every entry in a [`BTreeMap`] behind a
//! [`parking_lot::RwLock`]. Keys are ordered, so a prefix scan is a range
//! query starting at the prefix that stops at the first non-matching key.
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | get | O(log n) |
//! | set | O(log n) |
//! | del | O(log n) |
//! | get_by_prefix | O(log n + k) where k is result size |
//!
//! Data is lost when the process exits.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::kv::{KvStore, StoreResult};

/// In-memory [`KvStore`].
///
/// Cheaply cloneable; all clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        self.data.write().insert(key.to_owned(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> StoreResult<Vec<Value>> {
        let data = self.data.read();
        Ok(data
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect())
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> StoreResult<()> {
        let mut data = self.data.write();
        data.extend(entries);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
