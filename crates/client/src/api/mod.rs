//! REST client for the storefront backend.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per process, cheaply cloneable via `Arc`
//! - Every call goes through a single request helper that attaches the
//!   bearer token chosen by the call site ([`Credential`]), a JSON content
//!   type (unless the body is multipart) and an `x-request-id`
//! - Any non-2xx response becomes [`ApiError::Status`] carrying the HTTP
//!   status and the server-supplied `message`
//! - A 401 on an authenticated call invalidates the stored session token
//!
//! Endpoint groups are implemented as `impl ApiClient` blocks in the
//! submodules; admin endpoints live in the `shopfront-admin` crate and are
//! built on the public request helpers.

mod auth;
mod cart;
mod offers;
mod orders;
mod products;
mod qr;
mod reviews;
pub mod types;
mod wishlist;

pub use qr::decode_data_url;
pub use types::*;

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{Span, debug, instrument, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::storage::{SharedStore, keys};

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Maximum number of body characters kept in logs.
const LOG_BODY_LIMIT: usize = 500;

/// Errors returned by backend calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (connection, TLS, timeout).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// The request could not be built (e.g., a token with invalid characters).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of a rejected request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    /// Message suitable for a user-facing notification.
    ///
    /// Server messages are shown verbatim; transport and decode failures
    /// get a generic wording.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            Self::Transport(_) => "Network error. Please check your connection.".to_string(),
            Self::Decode(_) => "Unexpected response from server".to_string(),
            Self::InvalidRequest(msg) => msg.clone(),
        }
    }
}

/// Which stored bearer token a call should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// No `Authorization` header.
    Anonymous,
    /// The shopper's token (`token` in local storage), if present.
    Customer,
    /// The back-office token (`admin_token` in local storage), if present.
    Admin,
}

impl Credential {
    const fn storage_key(self) -> Option<&'static str> {
        match self {
            Self::Anonymous => None,
            Self::Customer => Some(keys::TOKEN),
            Self::Admin => Some(keys::ADMIN_TOKEN),
        }
    }
}

/// Body attached to a request.
enum Body<'a, B: Serialize + ?Sized> {
    Empty,
    Json(&'a B),
    Multipart(reqwest::multipart::Form),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    root: String,
    local: SharedStore,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("root", &self.inner.root)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// Tokens are read from `local` on every call, so logins performed through
    /// any handle sharing the same storage are picked up immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, local: SharedStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("shopfront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                root: config.api_root(),
                local,
            }),
        })
    }

    /// Local storage the client reads tokens from.
    #[must_use]
    pub fn local_storage(&self) -> &SharedStore {
        &self.inner.local
    }

    /// Absolute URL of a route (e.g., `/cart` -> `http://host/api/cart`).
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.root, path.trim_start_matches('/'))
    }

    /// Whether a token for `credential` is currently stored.
    #[must_use]
    pub fn has_token(&self, credential: Credential) -> bool {
        self.token(credential).is_some()
    }

    fn token(&self, credential: Credential) -> Option<SecretString> {
        let key = credential.storage_key()?;
        self.inner
            .local
            .get(key)
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    /// `GET` a route and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status or an
    /// undecodable body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Credential,
    ) -> Result<T, ApiError> {
        self.send(Method::GET, path, None::<&()>, Body::<()>::Empty, credential)
            .await
    }

    /// `GET` a route with query parameters.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        credential: Credential,
    ) -> Result<T, ApiError> {
        self.send(Method::GET, path, Some(query), Body::<()>::Empty, credential)
            .await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        credential: Credential,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, None::<&()>, Body::Json(body), credential)
            .await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        credential: Credential,
    ) -> Result<T, ApiError> {
        self.send(Method::PUT, path, None::<&()>, Body::Json(body), credential)
            .await
    }

    /// `PUT` a route without a body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn put_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Credential,
    ) -> Result<T, ApiError> {
        self.send(Method::PUT, path, None::<&()>, Body::<()>::Empty, credential)
            .await
    }

    /// `PATCH` a route without a body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Credential,
    ) -> Result<T, ApiError> {
        self.send(Method::PATCH, path, None::<&()>, Body::<()>::Empty, credential)
            .await
    }

    /// `DELETE` a route.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Credential,
    ) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, None::<&()>, Body::<()>::Empty, credential)
            .await
    }

    /// `DELETE` a route with query parameters.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn delete_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        credential: Credential,
    ) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, Some(query), Body::<()>::Empty, credential)
            .await
    }

    /// `POST` a multipart form (file uploads). No JSON content type is set.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        credential: Credential,
    ) -> Result<T, ApiError> {
        self.send(
            Method::POST,
            path,
            None::<&()>,
            Body::<()>::Multipart(form),
            credential,
        )
        .await
    }

    /// Build, send and decode one request.
    #[instrument(
        skip(self, method, query, body),
        fields(method = %method, request_id = tracing::field::Empty)
    )]
    async fn send<T, Q, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Q>,
        body: Body<'_, B>,
        credential: Credential,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let mut request = self
            .inner
            .http
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, &request_id);

        if let Some(token) = self.token(credential) {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                bearer_header(&token)?,
            );
        }

        if let Some(query) = query {
            request = request.query(query);
        }

        request = match body {
            Body::Empty => request.header(CONTENT_TYPE, "application/json"),
            Body::Json(value) => request
                .header(CONTENT_TYPE, "application/json")
                .json(value),
            Body::Multipart(form) => request.multipart(form),
        };

        self.execute(request, credential).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        credential: Credential,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = extract_message(status, &text);
            debug!(
                status = %status,
                body = %truncate(&text),
                "Backend rejected request"
            );
            if status == StatusCode::UNAUTHORIZED {
                self.invalidate(credential);
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let payload = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(payload).map_err(|e| {
            warn!(
                error = %e,
                body = %truncate(&text),
                "Failed to decode backend response"
            );
            ApiError::Decode(e.to_string())
        })
    }

    /// Drop the stored token after the backend rejected it.
    fn invalidate(&self, credential: Credential) {
        let keys_to_clear: &[&str] = match credential {
            Credential::Anonymous => return,
            Credential::Customer => &[keys::TOKEN, keys::USER],
            Credential::Admin => &[keys::ADMIN_TOKEN],
        };
        warn!(credential = ?credential, "Token rejected by backend, clearing stored session");
        for key in keys_to_clear {
            if let Err(e) = self.inner.local.remove(key) {
                warn!(key, error = %e, "Failed to clear rejected token");
            }
        }
    }
}

fn bearer_header(token: &SecretString) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
        .map_err(|_| ApiError::InvalidRequest("Stored token is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Pull the server-supplied message out of an error body.
///
/// Falls back to the HTTP reason phrase when the body carries no message.
fn extract_message(status: StatusCode, body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status.canonical_reason().map_or_else(
                || format!("Request failed with status {}", status.as_u16()),
                str::to_string,
            )
        })
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}
