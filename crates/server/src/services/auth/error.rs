//! Authentication error types.

use thiserror::Error;

use lpg_core::IdentityError;

use crate::db::RepositoryError;
use crate::provider::ProviderError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more required fields are missing or empty.
    #[error("{0}")]
    MissingFields(&'static str),

    /// The username cannot be mapped onto an identity email.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] IdentityError),

    /// Another profile already uses this username.
    #[error("username already exists")]
    UsernameTaken,

    /// The provider refused to create the account.
    #[error("account creation rejected: {0}")]
    CreateRejected(ProviderError),

    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The provider knows the account but no profile exists.
    #[error("user profile not found")]
    ProfileNotFound,

    /// No bearer token was presented.
    #[error("no access token provided")]
    MissingToken,

    /// The bearer token was rejected.
    #[error("invalid or expired session")]
    InvalidSession,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
