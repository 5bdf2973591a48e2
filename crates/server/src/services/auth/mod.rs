//! Authentication service.
//!
//! Bridges usernames onto the auth provider's email identities and keeps the
//! user profile in the store in step with the provider account.

mod error;

pub use error::AuthError;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{instrument, warn};

use lpg_core::{IdentityEmail, Role, User, UserId};

use crate::db::UserRepository;
use crate::db::kv::KvStore;
use crate::provider::{AuthProvider, ProviderError};

/// A successful sign-in.
#[derive(Debug)]
pub struct SignedIn {
    /// Provider-issued bearer token.
    pub access_token: SecretString,
    /// The signed-in user's profile.
    pub user: User,
}

/// Authentication service.
///
/// Handles signup, sign-in, session checks and sign-out.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    provider: &'a dyn AuthProvider,
    identity_domain: &'a str,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        store: &'a dyn KvStore,
        provider: &'a dyn AuthProvider,
        identity_domain: &'a str,
    ) -> Self {
        Self {
            users: UserRepository::new(store),
            provider,
            identity_domain,
        }
    }

    /// Register a new account and its profile.
    ///
    /// The username check is a scan followed by a write, so two concurrent
    /// signups for the same name can both succeed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if any field is empty.
    /// Returns `AuthError::UsernameTaken` if a profile already uses the name.
    /// Returns `AuthError::CreateRejected` if the provider refuses the account.
    #[instrument(skip(self, password), fields(username = %username, role = %role))]
    pub async fn sign_up(
        &self,
        username: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<User, AuthError> {
        if username.is_empty() || password.expose_secret().is_empty() || role.as_str().is_empty()
        {
            return Err(AuthError::MissingFields(
                "Username, password, and role are required",
            ));
        }

        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let email = IdentityEmail::for_username(username, self.identity_domain)?;
        let id = self
            .provider
            .create_user(&email, password)
            .await
            .map_err(AuthError::CreateRejected)?;

        let user = User::new(id, username, role, Utc::now());
        self.users.put(&user).await?;

        tracing::info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Verify credentials and return a session with the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if either field is empty.
    /// Returns `AuthError::InvalidCredentials` for any provider failure.
    /// Returns `AuthError::ProfileNotFound` if the account has no profile.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn sign_in(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<SignedIn, AuthError> {
        if username.is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::MissingFields(
                "Username and password are required",
            ));
        }

        // A username that cannot form an identity email cannot have an account.
        let email = IdentityEmail::for_username(username, self.identity_domain)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let session = self
            .provider
            .sign_in(&email, password)
            .await
            .map_err(|e| {
                if !matches!(e, ProviderError::InvalidCredentials) {
                    warn!(error = %e, "Provider sign-in failed");
                }
                AuthError::InvalidCredentials
            })?;

        let user = self
            .users
            .get(&session.user_id)
            .await?
            .ok_or(AuthError::ProfileNotFound)?;

        Ok(SignedIn {
            access_token: session.access_token,
            user,
        })
    }

    /// Resolve a bearer token to the provider account ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingToken` if no token is given.
    /// Returns `AuthError::InvalidSession` for any provider failure.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, token: Option<&str>) -> Result<UserId, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        self.provider.get_user(token).await.map_err(|e| {
            if !matches!(e, ProviderError::InvalidToken) {
                warn!(error = %e, "Provider token check failed");
            }
            AuthError::InvalidSession
        })
    }

    /// Resolve a bearer token to the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`authenticate`](Self::authenticate), plus
    /// `AuthError::ProfileNotFound` if the account has no profile.
    pub async fn session(&self, token: Option<&str>) -> Result<User, AuthError> {
        let id = self.authenticate(token).await?;
        self.users.get(&id).await?.ok_or(AuthError::ProfileNotFound)
    }

    /// End the session behind `token`, if any.
    ///
    /// Never fails: provider errors are logged and swallowed.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, token: Option<&str>) {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return;
        };
        if let Err(e) = self.provider.sign_out(token).await {
            warn!(error = %e, "Provider sign-out failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::provider::MemoryAuthProvider;

    const DOMAIN: &str = "k4jlpg.local";

    fn secret(s: &str) -> SecretString {
        SecretString::from(s)
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let auth = AuthService::new(&store, &provider, DOMAIN);

        let created = auth
            .sign_up("maria", &secret("pw123456"), Role::staff())
            .await
            .unwrap();
        let signed_in = auth.sign_in("maria", &secret("pw123456")).await.unwrap();

        assert_eq!(signed_in.user, created);
        assert!(!signed_in.access_token.expose_secret().is_empty());

        let session = auth
            .session(Some(signed_in.access_token.expose_secret()))
            .await
            .unwrap();
        assert_eq!(session.id, created.id);
    }

    #[tokio::test]
    async fn test_sign_up_requires_all_fields() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let auth = AuthService::new(&store, &provider, DOMAIN);

        for (username, password, role) in [("", "pw", "staff"), ("a", "", "staff"), ("a", "pw", "")] {
            let err = auth
                .sign_up(username, &secret(password), Role::from(role))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::MissingFields(_)));
        }
        assert_eq!(provider.account_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_username_leaves_one_account() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let auth = AuthService::new(&store, &provider, DOMAIN);

        auth.sign_up("dup", &secret("pw1"), Role::staff())
            .await
            .unwrap();
        let err = auth
            .sign_up("dup", &secret("pw2"), Role::admin())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::UsernameTaken));
        assert_eq!(provider.account_count(), 1);
        assert_eq!(UserRepository::new(&store).list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_is_generic() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let auth = AuthService::new(&store, &provider, DOMAIN);
        auth.sign_up("a", &secret("right"), Role::staff())
            .await
            .unwrap();

        assert!(matches!(
            auth.sign_in("a", &secret("wrong")).await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            auth.sign_in("nobody", &secret("x")).await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_account_without_profile() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let email = IdentityEmail::for_username("ghost", DOMAIN).unwrap();
        provider.create_user(&email, &secret("pw")).await.unwrap();

        let auth = AuthService::new(&store, &provider, DOMAIN);
        assert!(matches!(
            auth.sign_in("ghost", &secret("pw")).await.unwrap_err(),
            AuthError::ProfileNotFound
        ));
    }

    #[tokio::test]
    async fn test_session_errors() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let auth = AuthService::new(&store, &provider, DOMAIN);

        assert!(matches!(
            auth.session(None).await.unwrap_err(),
            AuthError::MissingToken
        ));
        assert!(matches!(
            auth.session(Some("")).await.unwrap_err(),
            AuthError::MissingToken
        ));
        assert!(matches!(
            auth.session(Some("bogus")).await.unwrap_err(),
            AuthError::InvalidSession
        ));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_and_never_fails() {
        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let auth = AuthService::new(&store, &provider, DOMAIN);
        auth.sign_up("a", &secret("pw"), Role::staff())
            .await
            .unwrap();
        let signed_in = auth.sign_in("a", &secret("pw")).await.unwrap();
        let token = signed_in.access_token.expose_secret().to_owned();

        auth.sign_out(Some(&token)).await;
        assert!(matches!(
            auth.session(Some(&token)).await.unwrap_err(),
            AuthError::InvalidSession
        ));

        auth.sign_out(Some(&token)).await;
        auth.sign_out(Some("garbage")).await;
        auth.sign_out(None).await;
    }
}
