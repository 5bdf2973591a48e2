//! Typed client for the K4J LPG Center API.
//!
//! [`ApiClient`] mirrors every server endpoint, keeps the bearer token
//! returned by sign-in, and turns `{"error": ...}` responses into
//! [`ClientError::Api`]. With a [`ProductCache`] attached, the product list
//! is still served while the API is unreachable.
//!
//! ```rust,ignore
//! use lpg_client::ApiClient;
//! use secrecy::SecretString;
//!
//! let client = ApiClient::new("http://127.0.0.1:3002/make-server-9f945771")?;
//! client.sign_in("admin", &SecretString::from("admin123")).await?;
//! for product in client.products().await? {
//!     println!("{} x{}", product.name, product.quantity);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod cache;
mod client;
mod error;

pub use cache::{CachedProducts, ProductCache};
pub use client::{ApiClient, DashboardStats, ProductList};
pub use error::ClientError;
