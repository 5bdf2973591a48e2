//! HTTP route handlers.
//!
//! # Route Structure
//!
//! Every API route lives under the configured prefix
//! (default `/make-server-9f945771`):
//!
//! ```text
//! # Auth
//! POST   /auth/signup         - Register account and profile
//! POST   /auth/signin         - Exchange credentials for a bearer token
//! GET    /auth/session        - Caller's profile (bearer)
//! POST   /auth/signout        - End session (bearer optional)
//!
//! # Products
//! GET    /products            - List (public)
//! POST   /products            - Create (admin)
//! PUT    /products/{id}       - Update (any signed-in user)
//! DELETE /products/{id}       - Delete (admin)
//!
//! # Users (admin)
//! GET    /users               - List
//! PUT    /users/{id}          - Update username/role
//! DELETE /users/{id}          - Delete account and profile
//!
//! # Setup
//! POST   /init                - Seed an empty store
//! GET    /health              - Liveness
//! GET    /health/ready        - Readiness (store reachable)
//! ```
//!
//! `/health` and `/health/ready` are also served at the root for load balancers.

pub mod auth;
pub mod init;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::cors_layer;
use crate::state::AppState;

/// API routes, relative to the route prefix.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/session", get(auth::session))
        .route("/auth/signout", post(auth::sign_out))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            put(products::update).delete(products::delete),
        )
        .route("/users", get(users::list))
        .route("/users/{id}", put(users::update).delete(users::delete))
        .route("/init", post(init::initialize))
        .route("/health", get(init::health))
        .route("/health/ready", get(init::readiness))
}

/// The complete application: prefixed API routes, root health checks,
/// request tracing and CORS.
pub fn app(state: AppState) -> Router {
    let prefix = state.config().route_prefix.clone();

    let router = if prefix.is_empty() {
        api_routes()
    } else {
        Router::new()
            .route("/health", get(init::health))
            .route("/health/ready", get(init::readiness))
            .nest(&prefix, api_routes())
    };

    router
        .layer(cors_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
