//! K4J LPG Center API library.
//!
//! Inventory and user management for a gas-cylinder retail shop. Records
//! live in a key-value store ([`db::KvStore`]); credentials and sessions
//! live with an external auth provider ([`provider::AuthProvider`]).
//!
//! The binary in `main.rs` wires these together from [`config::ServerConfig`];
//! tests build an [`state::AppState`] over the in-memory backends and drive
//! [`routes::app`] directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod provider;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use thiserror::Error;

use config::ServerConfig;
use db::{KvStore, MemoryStore, PgStore};
use provider::{AuthProvider, MemoryAuthProvider, ProviderError, SupabaseAuth};
use state::AppState;

/// Errors that can occur while connecting to backends at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The database pool could not be created.
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    /// The auth provider client could not be created.
    #[error("auth provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Build the application state, choosing backends from `config`.
///
/// Without a database URL the in-memory store is used; without Supabase
/// credentials the in-memory auth provider is used. Both log a warning since
/// all data is lost on restart.
///
/// # Errors
///
/// Returns `StartupError` if a configured backend cannot be set up.
pub async fn connect(config: ServerConfig) -> Result<AppState, StartupError> {
    let store: Arc<dyn KvStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            tracing::info!("Database pool created");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("No database configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let provider: Arc<dyn AuthProvider> = match &config.supabase {
        Some(supabase) => {
            let auth = SupabaseAuth::new(&supabase.url, supabase.service_role_key.clone())?;
            tracing::info!(url = %supabase.url, "Supabase auth configured");
            Arc::new(auth)
        }
        None => {
            tracing::warn!(
                "No auth provider configured, using in-memory accounts (not for production)"
            );
            Arc::new(MemoryAuthProvider::new())
        }
    };

    Ok(AppState::new(config, store, provider))
}
