//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use lpg_core::api::{MessageResponse, ProductResponse, ProductsResponse};
use lpg_core::{NewProduct, ProductId, ProductPatch};

use crate::error::Result;
use crate::middleware::{AdminUser, AuthenticatedUser, JsonBody};
use crate::state::AppState;

/// List all products. No authentication.
///
/// GET /products
pub async fn list(State(state): State<AppState>) -> Result<Json<ProductsResponse>> {
    let products = state.products().list().await?;
    Ok(Json(ProductsResponse {
        success: true,
        products,
    }))
}

/// Create a product. Admin only.
///
/// POST /products
pub async fn create(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    JsonBody(draft): JsonBody<NewProduct>,
) -> Result<Json<ProductResponse>> {
    let product = state.products().create(draft).await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// Update a product. Any signed-in user.
///
/// PUT /products/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<ProductPatch>,
) -> Result<Json<ProductResponse>> {
    let product = state
        .products()
        .update(&ProductId::new(id), patch)
        .await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// Delete a product. Admin only.
///
/// DELETE /products/{id}
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.products().delete(&ProductId::new(id)).await?;
    Ok(Json(MessageResponse::ok("Product deleted successfully")))
}
