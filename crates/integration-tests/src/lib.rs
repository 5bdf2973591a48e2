//! End-to-end test harness for the K4J LPG Center API.
//!
//! [`TestServer::spawn`] serves the real router over the in-memory store and
//! auth provider on an ephemeral local port, so tests exercise the HTTP layer
//! and [`lpg_client::ApiClient`] together without external services.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lpg-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use lpg_client::ApiClient;
use lpg_server::config::ServerConfig;
use lpg_server::db::MemoryStore;
use lpg_server::provider::MemoryAuthProvider;
use lpg_server::routes;
use lpg_server::state::AppState;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A running API server bound to `127.0.0.1`.
///
/// The server task is aborted when the value is dropped.
pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    store: MemoryStore,
    provider: MemoryAuthProvider,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the default route prefix.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn() -> Self {
        let config = ServerConfig::default();
        let prefix = config.route_prefix.clone();

        let store = MemoryStore::new();
        let provider = MemoryAuthProvider::new();
        let state = AppState::new(
            config,
            Arc::new(store.clone()),
            Arc::new(provider.clone()),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");

        let app = routes::app(state);
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                report_serve_error(&e);
            }
        });

        Self {
            addr,
            base_url: format!("http://{addr}{prefix}"),
            store,
            provider,
            task,
        }
    }

    /// API root including the route prefix.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `http://host:port` without the prefix.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full URL for a path under the prefix, e.g. `url("products")`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// A fresh, signed-out client.
    ///
    /// # Panics
    ///
    /// Panics if the base URL does not parse.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url).expect("valid base url")
    }

    /// The backing store, for inspecting raw records.
    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// The backing auth provider.
    #[must_use]
    pub const fn provider(&self) -> &MemoryAuthProvider {
        &self.provider
    }

    /// Seed the deployment and return a client signed in as the seed admin.
    ///
    /// # Panics
    ///
    /// Panics if seeding or sign-in fails.
    pub async fn admin_client(&self) -> ApiClient {
        let client = self.client();
        client.initialize().await.expect("initialize");
        client
            .sign_in("admin", &password("admin123"))
            .await
            .expect("admin sign-in");
        client
    }

    /// Register an account and return a client signed in as it.
    ///
    /// # Panics
    ///
    /// Panics if sign-up or sign-in fails.
    pub async fn signed_in(&self, username: &str, pass: &str, role: &str) -> ApiClient {
        let client = self.client();
        client
            .sign_up(username, &password(pass), role)
            .await
            .expect("sign-up");
        client
            .sign_in(username, &password(pass))
            .await
            .expect("sign-in");
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Wrap a literal password.
#[must_use]
pub fn password(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

#[allow(clippy::print_stderr)]
fn report_serve_error(err: &std::io::Error) {
    eprintln!("test server stopped: {err}");
}
