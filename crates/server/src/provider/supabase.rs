//! Supabase (GoTrue) authentication provider.
//!
//! Talks to the GoTrue REST API exposed under `<project url>/auth/v1`. Admin
//! operations (account creation and deletion) authenticate with the
//! service-role key; session operations send the user's bearer token.
//!
//! Request URLs are assembled with [`Url::path_segments_mut`], so caller
//! supplied values (user IDs) are always a single percent-encoded segment
//! under `/admin/users/` and can never add path segments or a query.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use lpg_core::{IdentityEmail, UserId};

use super::{AuthProvider, ProviderError, ProviderSession};

/// GoTrue error code for a duplicate email.
const EMAIL_EXISTS_CODE: &str = "email_exists";

/// Message used when a user ID cannot name a GoTrue account.
const USER_NOT_FOUND: &str = "User not found";

/// Supabase auth client.
///
/// Cheaply cloneable; all clones share one HTTP connection pool.
#[derive(Clone)]
pub struct SupabaseAuth {
    inner: Arc<SupabaseAuthInner>,
}

struct SupabaseAuthInner {
    client: reqwest::Client,
    /// `<project url>/auth/v1`.
    auth_url: Url,
    service_key: SecretString,
}

#[derive(Serialize)]
struct CreateUserRequest<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
}

#[derive(Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserResponse,
}

/// Error body returned by GoTrue. Field names vary between versions.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

impl ErrorBody {
    fn into_message(self, status: StatusCode) -> (Option<String>, String) {
        let message = self
            .msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| format!("HTTP {status}"));
        (self.error_code, message)
    }
}

impl SupabaseAuth {
    /// Create a client for the project at `project_url`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Http` if the HTTP client cannot be built, or
    /// `ProviderError::InvalidUrl` if `project_url` cannot carry a path.
    pub fn new(project_url: &Url, service_key: SecretString) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let mut auth_url = project_url.clone();
        auth_url.set_query(None);
        auth_url.set_fragment(None);
        auth_url
            .path_segments_mut()
            .map_err(|()| ProviderError::InvalidUrl(project_url.to_string()))?
            .pop_if_empty()
            .extend(["auth", "v1"]);

        Ok(Self {
            inner: Arc::new(SupabaseAuthInner {
                client,
                auth_url,
                service_key,
            }),
        })
    }

    /// `<auth url>/<segments...>`, each segment percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.auth_url.clone();
        // `new` rejected URLs that cannot take path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    /// Request builder carrying the service-role key as both API key and
    /// bearer token.
    fn admin_request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let key = self.inner.service_key.expose_secret();
        self.inner
            .client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
    }

    /// Request builder carrying the API key and a user's bearer token.
    fn user_request(
        &self,
        method: reqwest::Method,
        url: Url,
        access_token: &str,
    ) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header("apikey", self.inner.service_key.expose_secret())
            .bearer_auth(access_token)
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn create_user(
        &self,
        email: &IdentityEmail,
        password: &SecretString,
    ) -> Result<UserId, ProviderError> {
        let response = self
            .admin_request(reqwest::Method::POST, self.endpoint(&["admin", "users"]))
            .json(&CreateUserRequest {
                email: email.as_str(),
                password: password.expose_secret(),
                email_confirm: true,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let user: UserResponse = response.json().await?;
            Ok(UserId::new(user.id))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status, &body))
        }
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &IdentityEmail,
        password: &SecretString,
    ) -> Result<ProviderSession, ProviderError> {
        let mut url = self.endpoint(&["token"]);
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .inner
            .client
            .post(url)
            .header("apikey", self.inner.service_key.expose_secret())
            .json(&PasswordGrantRequest {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let token: TokenResponse = response.json().await?;
            Ok(ProviderSession {
                access_token: SecretString::from(token.access_token),
                user_id: UserId::new(token.user.id),
            })
        } else if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            Err(ProviderError::InvalidCredentials)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status, &body))
        }
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<UserId, ProviderError> {
        let response = self
            .user_request(reqwest::Method::GET, self.endpoint(&["user"]), access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let user: UserResponse = response.json().await?;
            Ok(UserId::new(user.id))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ProviderError::InvalidToken)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status, &body))
        }
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let mut url = self.endpoint(&["logout"]);
        url.query_pairs_mut().append_pair("scope", "global");

        let response = self
            .user_request(reqwest::Method::POST, url, access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ProviderError::InvalidToken)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status, &body))
        }
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete_user(&self, id: &UserId) -> Result<(), ProviderError> {
        // GoTrue account IDs are UUIDs; anything else cannot exist there
        let Ok(uuid) = Uuid::parse_str(id.as_str()) else {
            tracing::warn!("Refusing provider delete for non-UUID user id");
            return Err(ProviderError::Rejected {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: USER_NOT_FOUND.to_string(),
            });
        };

        let url = self.endpoint(&["admin", "users", &uuid.hyphenated().to_string()]);
        let response = self
            .admin_request(reqwest::Method::DELETE, url)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status, &body))
        }
    }
}

/// Map a non-success GoTrue response onto a [`ProviderError`].
fn classify_error(status: StatusCode, body: &str) -> ProviderError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let (code, message) = parsed.into_message(status);

    let already_registered = code.as_deref() == Some(EMAIL_EXISTS_CODE)
        || message.to_lowercase().contains("already registered")
        || message.to_lowercase().contains("already been registered");

    if already_registered {
        ProviderError::AlreadyRegistered(message)
    } else {
        ProviderError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_email_exists_code() {
        let body = r#"{"code":422,"error_code":"email_exists","msg":"A user with this email address has already been registered"}"#;
        let err = classify_error(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert!(err.is_already_registered());
        assert_eq!(
            err.to_string(),
            "A user with this email address has already been registered"
        );
    }

    #[test]
    fn test_classify_legacy_message() {
        let body = r#"{"message":"User already registered"}"#;
        assert!(classify_error(StatusCode::BAD_REQUEST, body).is_already_registered());
    }

    #[test]
    fn test_classify_other_rejection() {
        let body = r#"{"error_code":"weak_password","msg":"Password should be at least 6 characters"}"#;
        match classify_error(StatusCode::UNPROCESSABLE_ENTITY, body) {
            ProviderError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Password should be at least 6 characters");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_error_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            classify_error(StatusCode::BAD_REQUEST, body).to_string(),
            "Invalid login credentials"
        );
    }

    #[test]
    fn test_classify_unparseable_body() {
        match classify_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") {
            ProviderError::Rejected { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "HTTP 502 Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn auth_at(base: &str) -> SupabaseAuth {
        SupabaseAuth::new(&Url::parse(base).unwrap(), SecretString::from("key")).unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let auth = auth_at("https://project.supabase.co/");
        assert_eq!(
            auth.endpoint(&["user"]).as_str(),
            "https://project.supabase.co/auth/v1/user"
        );
    }

    #[test]
    fn test_endpoint_keeps_project_path() {
        let auth = auth_at("https://gateway.example/tenant/");
        assert_eq!(
            auth.endpoint(&["admin", "users"]).as_str(),
            "https://gateway.example/tenant/auth/v1/admin/users"
        );
    }

    #[test]
    fn test_endpoint_encodes_segment() {
        let auth = auth_at("https://project.supabase.co");
        let url = auth.endpoint(&["admin", "users", "../../../rest/v1/products?id=gt.0"]);

        assert_eq!(
            url.path(),
            "/auth/v1/admin/users/..%2F..%2F..%2Frest%2Fv1%2Fproducts%3Fid=gt.0"
        );
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_rejects_cannot_be_a_base_url() {
        let url = Url::parse("mailto:ops@example.com").unwrap();
        let err = SupabaseAuth::new(&url, SecretString::from("key")).err().unwrap();
        assert!(matches!(err, ProviderError::InvalidUrl(_)));
    }

    // =========================================================================
    // Against a local GoTrue stand-in
    // =========================================================================

    type Seen = Arc<parking_lot::Mutex<Vec<String>>>;

    /// Serve `{}` for every request and record `METHOD /path?query`.
    async fn recording_gotrue() -> (SupabaseAuth, Seen) {
        let seen: Seen = Arc::default();
        let log = Arc::clone(&seen);
        let app = axum::Router::new().fallback(move |request: axum::extract::Request| {
            let log = Arc::clone(&log);
            async move {
                log.lock()
                    .push(format!("{} {}", request.method(), request.uri()));
                axum::Json(serde_json::json!({"id": "00000000-0000-0000-0000-000000000000"}))
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (auth_at(&format!("http://{addr}/")), seen)
    }

    #[tokio::test]
    async fn test_delete_user_hits_admin_users_only() {
        let (auth, seen) = recording_gotrue().await;
        let id = UserId::new("5f0c4c1e-8a4b-4d59-9a57-3c0f7a1e2b3d");

        auth.delete_user(&id).await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec!["DELETE /auth/v1/admin/users/5f0c4c1e-8a4b-4d59-9a57-3c0f7a1e2b3d".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_user_with_path_in_id_never_leaves_provider() {
        let (auth, seen) = recording_gotrue().await;

        for raw in [
            "../../../rest/v1/products?id=gt.0",
            "..",
            "",
            "abc/def",
        ] {
            let err = auth.delete_user(&UserId::new(raw)).await.unwrap_err();
            assert!(
                matches!(err, ProviderError::Rejected { status: 404, .. }),
                "{raw}: {err:?}"
            );
        }

        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_session_endpoints_use_fixed_paths() {
        let (auth, seen) = recording_gotrue().await;

        auth.get_user("../admin/users?x=1").await.unwrap();
        auth.sign_out("tok").await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                "GET /auth/v1/user".to_string(),
                "POST /auth/v1/logout?scope=global".to_string(),
            ]
        );
    }
}
