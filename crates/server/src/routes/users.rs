//! User administration route handlers. Admin only.

use axum::{
    Json,
    extract::{Path, State},
};

use lpg_core::api::{MessageResponse, UserResponse, UsersResponse};
use lpg_core::{UserId, UserPatch};

use crate::error::Result;
use crate::middleware::{AdminUser, JsonBody};
use crate::state::AppState;

/// GET /users
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<UsersResponse>> {
    let users = state.users().list().await?;
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

/// PUT /users/{id}
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> Result<Json<UserResponse>> {
    let user = state.users().update(&UserId::new(id), patch).await?;
    Ok(Json(UserResponse {
        success: true,
        user,
        message: None,
    }))
}

/// DELETE /users/{id}
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.users().delete(&admin.id, &UserId::new(id)).await?;
    Ok(Json(MessageResponse::ok("User deleted successfully")))
}
