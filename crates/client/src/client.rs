//! API client implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use lpg_core::api::{
    ErrorResponse, HealthResponse, MessageResponse, ProductResponse, ProductsResponse,
    SignInResponse, UserResponse, UsersResponse,
};
use lpg_core::{NewProduct, Product, ProductId, ProductPatch, User, UserId, UserPatch};

use crate::{ClientError, ProductCache};

/// Timeout for the reachability check.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    /// Number of products.
    pub total_products: usize,
    /// Products at or below their low stock threshold.
    pub low_stock: usize,
    /// Number of users, when the caller may list them.
    pub total_users: Option<usize>,
}

/// A product list and where it came from.
#[derive(Debug, Clone)]
pub struct ProductList {
    pub products: Vec<Product>,
    /// `Some(fetched_at)` when the API was unreachable and the list came from
    /// the offline cache.
    pub cached_at: Option<DateTime<Utc>>,
}

/// K4J LPG Center API client.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the session
/// token.
///
/// # Authentication
///
/// [`sign_in`](Self::sign_in) stores the returned bearer token and every
/// later call sends it. [`sign_out`](Self::sign_out) and a rejected
/// [`check_session`](Self::check_session) clear it.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    /// API root including the route prefix, always ending in `/`.
    base_url: Url,
    token: RwLock<Option<SecretString>>,
    product_cache: RwLock<Option<ProductCache>>,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// `base_url` includes the route prefix, for example
    /// `http://127.0.0.1:3002/make-server-9f945771`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Self::with_client(client, base_url)
    }

    /// Create a client using an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let base_url = normalize_base(base_url)?;
        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                token: RwLock::new(None),
                product_cache: RwLock::new(None),
            }),
        })
    }

    /// The API root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Session token
    // =========================================================================

    /// The current bearer token, if signed in.
    pub async fn token(&self) -> Option<SecretString> {
        self.inner.token.read().await.clone()
    }

    /// Set the bearer token directly (for restoring a saved session).
    pub async fn set_token(&self, token: SecretString) {
        *self.inner.token.write().await = Some(token);
    }

    /// Forget the bearer token.
    pub async fn clear_token(&self) {
        *self.inner.token.write().await = None;
    }

    /// Whether a bearer token is held.
    pub async fn is_signed_in(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Keep a copy of every fetched product list in `cache` and fall back to
    /// it while the API is unavailable.
    pub async fn set_product_cache(&self, cache: ProductCache) {
        *self.inner.product_cache.write().await = Some(cache);
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Register an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with the server's message on rejection.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        username: &str,
        password: &SecretString,
        role: &str,
    ) -> Result<User, ClientError> {
        let body = json!({
            "username": username,
            "password": password.expose_secret(),
            "role": role,
        });
        let response: UserResponse = self
            .send(self.request(Method::POST, &["auth", "signup"])?.json(&body))
            .await?;
        Ok(response.user)
    }

    /// Sign in and keep the returned token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` (401) for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, username: &str, password: &SecretString) -> Result<User, ClientError> {
        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });
        let response: SignInResponse = self
            .send(self.request(Method::POST, &["auth", "signin"])?.json(&body))
            .await?;

        self.set_token(SecretString::from(response.access_token))
            .await;
        Ok(response.user)
    }

    /// Return the signed-in user's profile.
    ///
    /// Clears the stored token if the server rejects it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotSignedIn` without a token, or the server's
    /// error.
    #[instrument(skip(self))]
    pub async fn check_session(&self) -> Result<User, ClientError> {
        let request = self.authed(Method::GET, &["auth", "session"]).await?;
        match self.send::<UserResponse>(request).await {
            Ok(response) => Ok(response.user),
            Err(e) => {
                if e.is_unauthorized() {
                    self.clear_token().await;
                }
                Err(e)
            }
        }
    }

    /// Sign out and forget the token, even if the server call fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let token = self.inner.token.write().await.take();
        let mut request = self.request(Method::POST, &["auth", "signout"])?;
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        let _: MessageResponse = self.send(request).await?;
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List all products. No token needed.
    ///
    /// Falls back to the offline cache, if one is set, when the API is
    /// unavailable.
    ///
    /// # Errors
    ///
    /// Returns the server's error, or the transport error when there is no
    /// cached list to serve.
    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        Ok(self.product_list().await?.products)
    }

    /// Like [`products`](Self::products), but reports whether the list came
    /// from the offline cache.
    ///
    /// # Errors
    ///
    /// Same as [`products`](Self::products).
    #[instrument(skip(self))]
    pub async fn product_list(&self) -> Result<ProductList, ClientError> {
        let fetched = self.fetch_products().await;
        let cache = self.inner.product_cache.read().await.clone();
        let Some(cache) = cache else {
            return fetched.map(|products| ProductList {
                products,
                cached_at: None,
            });
        };

        match fetched {
            Ok(products) => {
                if let Err(e) = cache.store(&products).await {
                    tracing::warn!(error = %e, path = %cache.path().display(), "Failed to update product cache");
                }
                Ok(ProductList {
                    products,
                    cached_at: None,
                })
            }
            Err(e) if e.is_unavailable() => match cache.load().await {
                Ok(Some(snapshot)) => {
                    tracing::warn!(error = %e, fetched_at = %snapshot.fetched_at, "API unavailable, serving cached products");
                    Ok(ProductList {
                        products: snapshot.products,
                        cached_at: Some(snapshot.fetched_at),
                    })
                }
                Ok(None) => Err(e),
                Err(cache_err) => {
                    tracing::warn!(error = %cache_err, "Product cache unreadable");
                    Err(e)
                }
            },
            Err(e) => Err(e),
        }
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, ClientError> {
        let response: ProductsResponse = self
            .send(self.optionally_authed(Method::GET, &["products"]).await?)
            .await?;
        Ok(response.products)
    }

    /// Create a product (admin).
    ///
    /// # Errors
    ///
    /// Returns the server's error, or `ClientError::NotSignedIn`.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn add_product(&self, product: &NewProduct) -> Result<Product, ClientError> {
        self.product_request(Method::POST, &["products"], product)
            .await
    }

    /// Update a product (any signed-in user).
    ///
    /// # Errors
    ///
    /// Returns the server's error, or `ClientError::NotSignedIn`.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, ClientError> {
        self.product_request(Method::PUT, &["products", id.as_str()], patch)
            .await
    }

    /// Delete a product (admin).
    ///
    /// # Errors
    ///
    /// Returns the server's error, or `ClientError::NotSignedIn`.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ClientError> {
        let request = self
            .authed(Method::DELETE, &["products", id.as_str()])
            .await?;
        let _: MessageResponse = self.send(request).await?;
        Ok(())
    }

    async fn product_request<B: Serialize + Sync>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<Product, ClientError> {
        let request = self.authed(method, segments).await?.json(body);
        let response: ProductResponse = self.send(request).await?;
        Ok(response.product)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// List all users (admin).
    ///
    /// # Errors
    ///
    /// Returns the server's error, or `ClientError::NotSignedIn`.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<User>, ClientError> {
        let response: UsersResponse = self.send(self.authed(Method::GET, &["users"]).await?).await?;
        Ok(response.users)
    }

    /// Update a user's username or role (admin).
    ///
    /// # Errors
    ///
    /// Returns the server's error, or `ClientError::NotSignedIn`.
    #[instrument(skip(self, patch), fields(user_id = %id))]
    pub async fn update_user(&self, id: &UserId, patch: &UserPatch) -> Result<User, ClientError> {
        let request = self
            .authed(Method::PUT, &["users", id.as_str()])
            .await?
            .json(patch);
        let response: UserResponse = self.send(request).await?;
        Ok(response.user)
    }

    /// Delete a user (admin, not yourself).
    ///
    /// # Errors
    ///
    /// Returns the server's error, or `ClientError::NotSignedIn`.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: &UserId) -> Result<(), ClientError> {
        let request = self
            .authed(Method::DELETE, &["users", id.as_str()])
            .await?;
        let _: MessageResponse = self.send(request).await?;
        Ok(())
    }

    // =========================================================================
    // Setup and health
    // =========================================================================

    /// Seed an empty store. Returns the server's message.
    ///
    /// # Errors
    ///
    /// Returns the server's error.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<String, ClientError> {
        let response: MessageResponse = self.send(self.request(Method::POST, &["init"])?).await?;
        Ok(response.message)
    }

    /// Liveness check.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.send(self.request(Method::GET, &["health"])?.timeout(HEALTH_TIMEOUT))
            .await
    }

    /// Whether the API answers its health check.
    pub async fn is_online(&self) -> bool {
        match self.health().await {
            Ok(health) => health.status == "ok",
            Err(e) => {
                tracing::debug!(error = %e, "API unreachable");
                false
            }
        }
    }

    /// Product and user counts for the dashboard.
    ///
    /// User counts need admin rights; for other callers `total_users` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list cannot be fetched.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let products = self.products().await?;
        let total_users = if self.is_signed_in().await {
            match self.users().await {
                Ok(users) => Some(users.len()),
                Err(ClientError::Api { status: 403, .. }) => None,
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        Ok(DashboardStats {
            total_products: products.len(),
            low_stock: products.iter().filter(|p| p.is_low_stock()).count(),
            total_users,
        })
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// `<base>/<segments...>`. Each segment is percent-encoded on its own, so
    /// an ID containing `/`, `?` or `%` stays one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(segments)?;
        Ok(self.inner.client.request(method, url))
    }

    async fn authed(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, ClientError> {
        let token = self.token().await.ok_or(ClientError::NotSignedIn)?;
        Ok(self.request(method, segments)?.bearer_auth(token.expose_secret()))
    }

    async fn optionally_authed(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, ClientError> {
        let request = self.request(method, segments)?;
        Ok(match self.token().await {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    Err(api_error(status.as_u16(), &body))
}

/// Build an API error from a failed response body.
fn api_error(status: u16, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                format!("HTTP {status}")
            } else {
                body.to_string()
            }
        });
    ClientError::Api { status, message }
}

/// Parse `raw` and ensure the path ends with `/`.
fn normalize_base(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
