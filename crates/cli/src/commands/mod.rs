//! CLI command implementations.
//!
//! Every command except `migrate` talks to the API through
//! [`lpg_client::ApiClient`]. Output goes to stdout; diagnostics go through
//! `tracing`.

#![allow(clippy::print_stdout)]

pub mod auth;
pub mod migrate;
pub mod products;
pub mod session;
pub mod stats;
pub mod users;

use std::path::PathBuf;

use lpg_client::{ApiClient, ClientError, ProductCache};
use secrecy::SecretString;
use thiserror::Error;

use session::{SessionError, SessionFile};

/// Anything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Migration(#[from] migrate::MigrationError),

    #[error("Not signed in; run `lpg login` first")]
    NotSignedIn,
}

/// Shared state for API-backed commands.
pub struct Context {
    pub client: ApiClient,
    pub session: SessionFile,
}

impl Context {
    /// Build the client and restore a saved token, if any.
    pub async fn open(api_url: &str, session_file: Option<PathBuf>) -> Result<Self, CliError> {
        let client = ApiClient::new(api_url)?;
        let session = SessionFile::resolve(session_file)?;
        client
            .set_product_cache(ProductCache::new(session.product_cache_path()))
            .await;

        if let Some(saved) = session.load()? {
            client
                .set_token(SecretString::from(saved.access_token))
                .await;
        }

        Ok(Self { client, session })
    }

    /// Fail early when a command needs a token and none is saved.
    pub async fn require_session(&self) -> Result<(), CliError> {
        if self.client.is_signed_in().await {
            Ok(())
        } else {
            Err(CliError::NotSignedIn)
        }
    }
}

/// Render a money amount in pesos.
fn peso(amount: rust_decimal::Decimal) -> String {
    format!("\u{20b1}{amount:.2}")
}
