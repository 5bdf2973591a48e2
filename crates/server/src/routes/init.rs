//! First-run initialization and health route handlers.

use axum::{Json, extract::State, http::StatusCode};

use lpg_core::api::{HealthResponse, MessageResponse};

use crate::error::Result;
use crate::state::AppState;

/// Seed default accounts and products on an empty store.
///
/// POST /init
pub async fn initialize(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    let outcome = state.seed().initialize().await?;
    Ok(Json(MessageResponse::ok(outcome.message())))
}

/// Liveness health check. Does not check dependencies.
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "K4J LPG Center API is running".to_string(),
    })
}

/// Readiness health check.
///
/// Returns 503 Service Unavailable if the store is not reachable.
///
/// GET /health/ready
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
