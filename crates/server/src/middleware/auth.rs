//! Authentication extractors.
//!
//! Tokens are opaque provider-issued strings presented as
//! `Authorization: Bearer <token>`. The provider decides whether a token is
//! valid; the store decides what role its owner has.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use lpg_core::{User, UserId};

use crate::error::{AppError, set_sentry_user};
use crate::services::AuthError;
use crate::state::AppState;

const UNAUTHORIZED: &str = "Unauthorized";
const ADMIN_REQUIRED: &str = "Admin access required";

/// The bearer token from the `Authorization` header, if any.
///
/// The header value is split on a space and the second part taken, so any
/// scheme word is accepted. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    /// Token as a string slice.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(' ').nth(1))
            .filter(|token| !token.is_empty())
            .map(str::to_owned);

        Ok(Self(token))
    }
}

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 "Unauthorized" when the token is missing or refused by
/// the provider. Does not require a profile to exist.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(AuthenticatedUser(id): AuthenticatedUser) -> String {
///     format!("Hello, {id}!")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        let id = state
            .auth()
            .authenticate(token.as_deref())
            .await
            .map_err(|e| match e {
                AuthError::Repository(e) => AppError::Repository(e),
                _ => AppError::Unauthorized(UNAUTHORIZED.to_string()),
            })?;

        set_sentry_user(&id, None);
        Ok(Self(id))
    }
}

/// Extractor that requires a valid bearer token owned by an admin.
///
/// Rejects with 401 as [`AuthenticatedUser`] does, and with 403
/// "Admin access required" when the caller has no profile or the profile's
/// role is not `admin`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(id) = AuthenticatedUser::from_request_parts(parts, state).await?;

        let user = crate::db::UserRepository::new(state.store())
            .get(&id)
            .await?
            .filter(User::is_admin)
            .ok_or_else(|| AppError::Forbidden(ADMIN_REQUIRED.to_string()))?;

        set_sentry_user(&user.id, Some(&user.username));
        Ok(Self(user))
    }
}
