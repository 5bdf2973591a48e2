//! User profile repository.
//!
//! Profiles live under `user:<id>` where `<id>` is the identifier issued by
//! the auth provider. Credentials are never stored here.

use serde_json::Value;
use tracing::{instrument, warn};

use lpg_core::{User, UserId};

use super::{KvStore, RepositoryError, decode};

/// Key namespace for user profiles.
pub const USER_PREFIX: &str = "user:";

/// Store key for a user profile.
#[must_use]
pub fn user_key(id: &UserId) -> String {
    format!("{USER_PREFIX}{id}")
}

/// Repository for user profile records.
pub struct UserRepository<'a> {
    store: &'a dyn KvStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new repository over a store.
    #[must_use]
    pub const fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the record is malformed.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let key = user_key(id);
        match self.store.get(&key).await? {
            Some(value) => decode(&key, value).map(Some),
            None => Ok(None),
        }
    }

    /// Create or replace a profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn put(&self, user: &User) -> Result<(), RepositoryError> {
        let value = serde_json::to_value(user).map_err(super::StoreError::from)?;
        self.store.set(&user_key(&user.id), value).await?;
        Ok(())
    }

    /// Delete a profile. Deleting an absent profile is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        self.store.del(&user_key(id)).await?;
        Ok(())
    }

    /// List every profile, in no particular order.
    ///
    /// Values under the namespace that do not decode as a profile are logged
    /// and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let values = self.store.get_by_prefix(USER_PREFIX).await?;
        Ok(decode_all(values))
    }

    /// Find a profile by exact username.
    ///
    /// This is a linear scan of the namespace. Checking for a username and
    /// then writing a profile is not atomic, so two concurrent signups may
    /// both succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|user| user.username == username))
    }
}

fn decode_all(values: Vec<Value>) -> Vec<User> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<User>(value) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Skipping malformed user record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use lpg_core::Role;
    use serde_json::json;

    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);
        let user = User::new(UserId::new("u-1"), "maria", Role::staff(), Utc::now());

        repo.put(&user).await.unwrap();
        assert_eq!(repo.get(&user.id).await.unwrap(), Some(user.clone()));
        assert!(store.get("user:u-1").await.unwrap().is_some());

        repo.delete(&user.id).await.unwrap();
        assert_eq!(repo.get(&user.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_username_is_exact() {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);
        repo.put(&User::new(UserId::new("1"), "admin", Role::admin(), Utc::now()))
            .await
            .unwrap();
        repo.put(&User::new(UserId::new("2"), "staff", Role::staff(), Utc::now()))
            .await
            .unwrap();

        let found = repo.find_by_username("staff").await.unwrap().unwrap();
        assert_eq!(found.id, UserId::new("2"));
        assert!(repo.find_by_username("Staff").await.unwrap().is_none());
        assert!(repo.find_by_username("adm").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_skips_malformed_records() {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);
        repo.put(&User::new(UserId::new("1"), "admin", Role::admin(), Utc::now()))
            .await
            .unwrap();
        store.set("user:broken", json!({"nope": true})).await.unwrap();
        store.set("product:1", json!({"name": "x"})).await.unwrap();

        let users = repo.list_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "admin");
    }

    #[tokio::test]
    async fn test_get_malformed_is_corruption() {
        let store = MemoryStore::new();
        store.set("user:bad", json!("string")).await.unwrap();
        let repo = UserRepository::new(&store);
        let err = repo.get(&UserId::new("bad")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
