//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::kv::KvStore;
use crate::provider::AuthProvider;
use crate::services::{AuthService, ProductService, SeedService, UserService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the configuration and the two
/// collaborators every request talks to: the key-value store and the auth
/// provider.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn KvStore>,
    provider: Arc<dyn AuthProvider>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn KvStore>,
        provider: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                provider,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the key-value store.
    #[must_use]
    pub fn store(&self) -> &dyn KvStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the auth provider.
    #[must_use]
    pub fn provider(&self) -> &dyn AuthProvider {
        self.inner.provider.as_ref()
    }

    /// Authentication service for this request.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            self.store(),
            self.provider(),
            &self.inner.config.identity_domain,
        )
    }

    /// Product service for this request.
    #[must_use]
    pub fn products(&self) -> ProductService<'_> {
        ProductService::new(self.store())
    }

    /// User administration service for this request.
    #[must_use]
    pub fn users(&self) -> UserService<'_> {
        UserService::new(self.store(), self.provider())
    }

    /// Initialization service for this request.
    #[must_use]
    pub fn seed(&self) -> SeedService<'_> {
        SeedService::new(
            self.store(),
            self.provider(),
            &self.inner.config.identity_domain,
        )
    }
}
