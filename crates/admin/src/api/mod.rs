//! Back-office REST endpoints.
//!
//! [`AdminApi`] is a thin wrapper over the storefront [`ApiClient`] whose
//! calls all carry the admin bearer token (`admin_token`). Endpoint groups
//! live in the submodules.

mod inventory;
mod offers;
mod orders;
mod qr;
pub mod types;

pub use qr::QrUpload;
pub use types::*;

use secrecy::{ExposeSecret, SecretString};
use shopfront_client::api::{ApiClient, ApiError, Credential};
use shopfront_core::Email;
use tracing::instrument;

/// Client for the admin endpoints.
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    /// Wrap a storefront client. Tokens come from its local storage.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The underlying storefront client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Whether an admin token is stored.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.client.has_token(Credential::Admin)
    }

    /// Exchange admin credentials for a token. Does not store it.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AdminLoginResponse, ApiError> {
        let body = AdminLoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        self.client
            .post("/admin/login", &body, Credential::Anonymous)
            .await
    }
}
