//! External authentication provider.
//!
//! The provider is the system of record for credentials and session tokens.
//! The application never sees password hashes: it hands a synthetic email
//! and a password to [`AuthProvider::create_user`] or
//! [`AuthProvider::sign_in`] and receives an opaque user ID and bearer token.
//!
//! # Implementations
//!
//! - [`SupabaseAuth`] - GoTrue-compatible REST API (production)
//! - [`MemoryAuthProvider`] - in-process accounts (tests and local development)

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use lpg_core::{IdentityEmail, UserId};

pub use memory::MemoryAuthProvider;
pub use supabase::SupabaseAuth;

/// Errors returned by an [`AuthProvider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the request.
    #[error("{message}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider-supplied message.
        message: String,
    },

    /// An account with this email already exists.
    #[error("{0}")]
    AlreadyRegistered(String),

    /// The email and password do not match an account.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// The bearer token is unknown, revoked, or expired.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider's response could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured provider URL cannot have a path appended.
    #[error("invalid provider URL: {0}")]
    InvalidUrl(String),
}

impl ProviderError {
    /// Whether this error means the account already exists.
    #[must_use]
    pub const fn is_already_registered(&self) -> bool {
        matches!(self, Self::AlreadyRegistered(_))
    }
}

/// A session issued by the provider after a successful sign-in.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    /// Bearer token for subsequent requests.
    pub access_token: SecretString,
    /// Provider ID of the signed-in account.
    pub user_id: UserId,
}

/// Contract the application needs from an authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create a confirmed account and return its provider ID.
    async fn create_user(
        &self,
        email: &IdentityEmail,
        password: &SecretString,
    ) -> Result<UserId, ProviderError>;

    /// Verify credentials and open a session.
    async fn sign_in(
        &self,
        email: &IdentityEmail,
        password: &SecretString,
    ) -> Result<ProviderSession, ProviderError>;

    /// Resolve a bearer token to the account it belongs to.
    async fn get_user(&self, access_token: &str) -> Result<UserId, ProviderError>;

    /// Revoke the session behind a bearer token.
    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;

    /// Permanently delete an account.
    async fn delete_user(&self, id: &UserId) -> Result<(), ProviderError>;
}
