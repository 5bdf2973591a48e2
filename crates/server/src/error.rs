//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. The response body is always
//! `{"error": "<message>"}`. Server errors (5xx) are captured to Sentry and
//! logged, and their details are replaced by a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use lpg_core::api::ErrorResponse;

use crate::db::RepositoryError;
use crate::provider::ProviderError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The request conflicts with existing data.
    #[error("{0}")]
    Conflict(String),

    /// No valid bearer token.
    #[error("{0}")]
    Unauthorized(String),

    /// Sign-in failed. Deliberately says nothing about which part was wrong.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// An administrator tried to delete their own account.
    #[error("Cannot delete your own account")]
    SelfDelete,

    /// The auth provider refused or failed an operation.
    #[error("{message}")]
    AuthProvider {
        /// Status to answer with.
        status: StatusCode,
        /// Message to pass through.
        message: String,
        /// Underlying provider error, if any.
        #[source]
        source: Option<ProviderError>,
    },

    /// Store or record decoding failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a provider error answered with `status`.
    pub fn provider(status: StatusCode, message: impl Into<String>, source: ProviderError) -> Self {
        Self::AuthProvider {
            status,
            message: message.into(),
            source: Some(source),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::SelfDelete => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AuthProvider { status, .. } => *status,
            Self::Repository(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingFields(message) => Self::Validation(message.to_string()),
            AuthError::InvalidUsername(e) => Self::Validation(format!("Invalid username: {e}")),
            AuthError::UsernameTaken => Self::Conflict("Username already exists".to_string()),
            AuthError::CreateRejected(e) => Self::provider(
                StatusCode::BAD_REQUEST,
                format!("Failed to create user: {e}"),
                e,
            ),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::ProfileNotFound => Self::NotFound("User data not found".to_string()),
            AuthError::MissingToken => Self::Unauthorized("No access token provided".to_string()),
            AuthError::InvalidSession => {
                Self::Unauthorized("Invalid or expired session".to_string())
            }
            AuthError::Repository(e) => Self::Repository(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}
