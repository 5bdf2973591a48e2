//! In-process authentication provider.
//!
//! Accounts and sessions live in process memory and vanish on restart. Tokens
//! are random UUIDs with no expiry; a token stays valid until it is signed
//! out or its account is deleted.
//!
//! Not for production use: passwords are held in memory as given.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use lpg_core::{IdentityEmail, UserId};

use super::{AuthProvider, ProviderError, ProviderSession};

struct Account {
    id: UserId,
    password: SecretString,
}

#[derive(Default)]
struct Accounts {
    /// Keyed by identity email.
    by_email: HashMap<String, Account>,
    /// Bearer token to account ID.
    sessions: HashMap<String, UserId>,
}

/// [`AuthProvider`] backed by in-memory maps.
///
/// Cheaply cloneable; all clones share the same accounts.
#[derive(Clone, Default)]
pub struct MemoryAuthProvider {
    accounts: Arc<Mutex<Accounts>>,
}

impl MemoryAuthProvider {
    /// Creates a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.lock().by_email.len()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn create_user(
        &self,
        email: &IdentityEmail,
        password: &SecretString,
    ) -> Result<UserId, ProviderError> {
        if password.expose_secret().is_empty() {
            return Err(ProviderError::Rejected {
                status: 422,
                message: "Password cannot be empty".to_owned(),
            });
        }

        let mut accounts = self.accounts.lock();
        if accounts.by_email.contains_key(email.as_str()) {
            return Err(ProviderError::AlreadyRegistered(
                "A user with this email address has already been registered".to_owned(),
            ));
        }

        let id = UserId::new(Uuid::new_v4().to_string());
        accounts.by_email.insert(
            email.as_str().to_owned(),
            Account {
                id: id.clone(),
                password: password.clone(),
            },
        );
        Ok(id)
    }

    async fn sign_in(
        &self,
        email: &IdentityEmail,
        password: &SecretString,
    ) -> Result<ProviderSession, ProviderError> {
        let mut accounts = self.accounts.lock();
        let id = match accounts.by_email.get(email.as_str()) {
            Some(account) if account.password.expose_secret() == password.expose_secret() => {
                account.id.clone()
            }
            _ => return Err(ProviderError::InvalidCredentials),
        };

        let token = Uuid::new_v4().simple().to_string();
        accounts.sessions.insert(token.clone(), id.clone());
        Ok(ProviderSession {
            access_token: SecretString::from(token),
            user_id: id,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<UserId, ProviderError> {
        self.accounts
            .lock()
            .sessions
            .get(access_token)
            .cloned()
            .ok_or(ProviderError::InvalidToken)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let mut accounts = self.accounts.lock();
        let id = accounts
            .sessions
            .remove(access_token)
            .ok_or(ProviderError::InvalidToken)?;
        // Global scope: every session of the account ends.
        accounts.sessions.retain(|_, owner| *owner != id);
        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), ProviderError> {
        let mut accounts = self.accounts.lock();
        let before = accounts.by_email.len();
        accounts.by_email.retain(|_, account| account.id != *id);
        if accounts.by_email.len() == before {
            return Err(ProviderError::Rejected {
                status: 404,
                message: "User not found".to_owned(),
            });
        }
        accounts.sessions.retain(|_, owner| owner != id);
        Ok(())
    }
}
