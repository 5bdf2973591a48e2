//! Request extractors and HTTP layers.
//!
//! # Layer Order (outermost first, see `main.rs` and [`crate::routes::app`])
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. CORS (permissive: any origin, method and header)
//!
//! Authentication is not a layer: handlers opt in through the extractors in
//! [`auth`].

pub mod auth;
pub mod json;

use tower_http::cors::CorsLayer;

pub use auth::{AdminUser, AuthenticatedUser, BearerToken};
pub use json::JsonBody;

/// Permissive CORS for browser front-ends served from any origin.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}
