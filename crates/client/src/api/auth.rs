//! Authentication and profile endpoints.

use secrecy::{ExposeSecret, SecretString};
use shopfront_core::Email;
use tracing::instrument;

use super::{
    ApiClient, ApiError, AuthResponse, Credential, LoginRequest, ProfileUpdate, RegisterRequest,
    UserProfile,
};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        self.post("/auth/login", &body, Credential::Anonymous).await
    }

    /// Create an account and return its bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the account already exists or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        let body = RegisterRequest {
            name,
            email: email.as_str(),
            password: password.expose_secret(),
        };
        self.post("/auth/register", &body, Credential::Anonymous)
            .await
    }

    /// Fetch the signed-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid session exists or the request fails.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.get("/users/profile", Credential::Customer).await
    }

    /// Update the signed-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid session exists or the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.put("/users/profile", update, Credential::Customer).await
    }
}
