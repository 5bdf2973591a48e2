//! User administration service.
//!
//! All operations assume the caller has already been checked for the admin
//! role.

use axum::http::StatusCode;
use chrono::Utc;
use tracing::{instrument, warn};

use lpg_core::{User, UserId, UserPatch};

use crate::db::UserRepository;
use crate::db::kv::KvStore;
use crate::error::{AppError, Result};
use crate::provider::{AuthProvider, ProviderError};

/// Profile listing, editing and account deletion.
pub struct UserService<'a> {
    users: UserRepository<'a>,
    provider: &'a dyn AuthProvider,
}

impl<'a> UserService<'a> {
    /// Create a new user service.
    #[must_use]
    pub const fn new(store: &'a dyn KvStore, provider: &'a dyn AuthProvider) -> Self {
        Self {
            users: UserRepository::new(store),
            provider,
        }
    }

    /// All profiles, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list(&self) -> Result<Vec<User>> {
        Ok(self.users.list_all().await?)
    }

    /// Merge `patch` over an existing profile.
    ///
    /// Renaming a user does not change the provider identity, so the user
    /// keeps signing in with the old username.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no profile has this ID.
    #[instrument(skip(self, patch), fields(user_id = %id))]
    pub async fn update(&self, id: &UserId, patch: UserPatch) -> Result<User> {
        let existing = self
            .users
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let updated = existing.apply(patch, Utc::now());
        self.users.put(&updated).await?;
        Ok(updated)
    }

    /// Delete an account from the provider, then its profile.
    ///
    /// The two deletions are not atomic. A provider failure aborts before the
    /// profile is touched; an account the provider no longer knows is treated
    /// as already deleted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SelfDelete` if `caller` and `id` are the same.
    /// Returns `AppError::AuthProvider` (500) if the provider fails.
    #[instrument(skip(self), fields(caller = %caller, user_id = %id))]
    pub async fn delete(&self, caller: &UserId, id: &UserId) -> Result<()> {
        if caller == id {
            return Err(AppError::SelfDelete);
        }

        match self.provider.delete_user(id).await {
            Ok(()) => {}
            Err(ProviderError::Rejected { status: 404, .. }) => {
                warn!("Provider account already gone, removing profile only");
            }
            Err(e) => {
                return Err(AppError::provider(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to delete user: {e}"),
                    e,
                ));
            }
        }

        self.users.delete(id).await?;
        tracing::info!("User deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lpg_core::{IdentityEmail, Role};
    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryStore;
    use crate::provider::MemoryAuthProvider;

    async fn seed_user(
        store: &MemoryStore,
        provider: &MemoryAuthProvider,
        username: &str,
        role: Role,
    ) -> User {
        let email = IdentityEmail::for_username(username, "k4jlpg.local").unwrap();
        let id = provider
            .create_user(&email, &SecretString::from("pw"))
            .await
            .unwrap();
        let user = User::new(id, username, role, Utc::now());
        UserRepository::new(store).put(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_self_delete_is_refused() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let admin = seed_user(&store, &provider, "admin", Role::admin()).await;
        let service = UserService::new(&store, &provider);

        let err = service.delete(&admin.id, &admin.id).await.unwrap_err();
        assert!(matches!(err, AppError::SelfDelete));
        assert_eq!(service.list().await.unwrap().len(), 1);
        assert_eq!(provider.account_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_account_and_profile() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let admin = seed_user(&store, &provider, "admin", Role::admin()).await;
        let staff = seed_user(&store, &provider, "staff", Role::staff()).await;
        let service = UserService::new(&store, &provider);

        service.delete(&admin.id, &staff.id).await.unwrap();
        assert_eq!(service.list().await.unwrap(), vec![admin]);
        assert_eq!(provider.account_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_profile_without_account() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let orphan = User::new(UserId::new("orphan"), "old", Role::staff(), Utc::now());
        UserRepository::new(&store).put(&orphan).await.unwrap();
        let service = UserService::new(&store, &provider);

        service
            .delete(&UserId::new("someone"), &orphan.id)
            .await
            .unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_id() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let staff = seed_user(&store, &provider, "staff", Role::staff()).await;
        let service = UserService::new(&store, &provider);

        let updated = service
            .update(
                &staff.id,
                UserPatch {
                    username: None,
                    role: Some(Role::admin()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, staff.id);
        assert_eq!(updated.username, "staff");
        assert!(updated.is_admin());
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let service = UserService::new(&store, &provider);
        let err = service
            .update(&UserId::new("x"), UserPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "User not found"));
    }
}
