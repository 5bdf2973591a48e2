//! Authentication route handlers.

use axum::{Json, extract::State};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use lpg_core::Role;
use lpg_core::api::{MessageResponse, SignInResponse, UserResponse};

use crate::error::Result;
use crate::middleware::{BearerToken, JsonBody};
use crate::state::AppState;

/// Signup request body. Missing fields are treated as empty.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

/// Sign-in request body. Missing fields are treated as empty.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Register an account and its profile.
///
/// POST /auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignUpRequest>,
) -> Result<Json<UserResponse>> {
    let password = SecretString::from(req.password);
    let user = state
        .auth()
        .sign_up(&req.username, &password, Role::new(req.role))
        .await?;

    Ok(Json(UserResponse {
        success: true,
        user,
        message: Some("User created successfully".to_string()),
    }))
}

/// Exchange credentials for a bearer token.
///
/// POST /auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignInRequest>,
) -> Result<Json<SignInResponse>> {
    let password = SecretString::from(req.password);
    let signed_in = state.auth().sign_in(&req.username, &password).await?;

    Ok(Json(SignInResponse {
        success: true,
        access_token: signed_in.access_token.expose_secret().to_owned(),
        user: signed_in.user,
    }))
}

/// Return the caller's profile.
///
/// GET /auth/session
pub async fn session(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<UserResponse>> {
    let user = state.auth().session(token.as_deref()).await?;

    Ok(Json(UserResponse {
        success: true,
        user,
        message: None,
    }))
}

/// End the caller's session. Always succeeds.
///
/// POST /auth/signout
pub async fn sign_out(State(state): State<AppState>, token: BearerToken) -> Json<MessageResponse> {
    state.auth().sign_out(token.as_deref()).await;
    Json(MessageResponse::ok("Signed out successfully"))
}
