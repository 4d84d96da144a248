//! Customer authentication state.
//!
//! The session (bearer token + minimal profile) lives in local storage under
//! `token` and `user`. [`AuthStore`] reads it on every access, so a 401 seen
//! by [`ApiClient`] (which clears those keys) is reflected immediately.

use secrecy::{ExposeSecret, SecretString};
use shopfront_core::{Email, EmailError, UserId};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, AuthResponse, ProfileUpdate, UserProfile};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::notify::{SharedNotifier, Toast};
use crate::storage::{StorageError, keys, read_json, write_json};

/// Minimum password length accepted by the registration form.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors from login, registration and profile operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email failed local validation.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Password shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Required form field left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The operation needs a signed-in customer.
    #[error("Please log in to continue")]
    NotAuthenticated,

    /// The backend rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A signed-in customer session.
#[derive(Clone)]
pub struct AuthSession {
    pub token: SecretString,
    pub user: UserProfile,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Registration form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl Registration {
    /// Check the form locally before any network call.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<Email, AuthError> {
        if self.name.trim().is_empty() {
            return Err(AuthError::MissingField("Name"));
        }
        let email = Email::parse(&self.email)?;
        if self.password.expose_secret().len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }
        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(email)
    }
}

/// Customer session store.
#[derive(Clone)]
pub struct AuthStore {
    api: ApiClient,
    notifier: SharedNotifier,
}

impl AuthStore {
    /// Create a store reading the session from the client's local storage.
    #[must_use]
    pub fn new(api: ApiClient, notifier: SharedNotifier) -> Self {
        Self { api, notifier }
    }

    /// The current session, if a token and profile are stored.
    #[must_use]
    pub fn session(&self) -> Option<AuthSession> {
        let local = self.api.local_storage();
        let token = local.get(keys::TOKEN).filter(|t| !t.is_empty())?;
        let user: UserProfile = read_json(local.as_ref(), keys::USER)?;
        Some(AuthSession {
            token: SecretString::from(token),
            user,
        })
    }

    /// Whether a customer token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.api.has_token(crate::api::Credential::Customer)
    }

    /// Id of the signed-in customer.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.session().map(|s| s.user.id)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is invalid, the credentials are
    /// rejected, or the session cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let email = match Email::parse(email) {
            Ok(email) => email,
            Err(e) => {
                self.notifier.notify(Toast::error("Please enter a valid email"));
                return Err(e.into());
            }
        };
        if password.expose_secret().is_empty() {
            self.notifier.notify(Toast::error("Password is required"));
            return Err(AuthError::MissingField("Password"));
        }

        match self.api.login(&email, password).await {
            Ok(response) => {
                let session = self.establish(response)?;
                self.notifier
                    .notify(Toast::success(format!("Welcome back, {}!", session.user.name)));
                Ok(session)
            }
            Err(e) => {
                self.notifier.notify(Toast::error(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid (no network call is made),
    /// the backend rejects the registration, or the session cannot be
    /// persisted.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<AuthSession, AuthError> {
        let email = match form.validate() {
            Ok(email) => email,
            Err(e) => {
                self.notifier.notify(Toast::error(e.to_string()));
                return Err(e);
            }
        };

        match self
            .api
            .register(form.name.trim(), &email, &form.password)
            .await
        {
            Ok(response) => {
                let session = self.establish(response)?;
                self.notifier.notify(Toast::success("Account created successfully"));
                Ok(session)
            }
            Err(e) => {
                self.notifier.notify(Toast::error(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Sign out, dropping the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed.
    pub fn logout(&self) -> Result<(), AuthError> {
        let local = self.api.local_storage();
        local.remove(keys::TOKEN)?;
        local.remove(keys::USER)?;
        clear_sentry_user();
        add_breadcrumb("auth", "Logged out", None);
        info!("Customer logged out");
        Ok(())
    }

    /// Refresh the stored profile from the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if no session exists or the request fails.
    pub async fn refresh_profile(&self) -> Result<UserProfile, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        let profile = self.api.profile().await?;
        write_json(self.api.local_storage().as_ref(), keys::USER, &profile)?;
        Ok(profile)
    }

    /// Update the profile and store the result.
    ///
    /// # Errors
    ///
    /// Returns an error if no session exists or the request fails.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        match self.api.update_profile(update).await {
            Ok(profile) => {
                write_json(self.api.local_storage().as_ref(), keys::USER, &profile)?;
                self.notifier.notify(Toast::success("Profile updated"));
                Ok(profile)
            }
            Err(e) => {
                self.notifier.notify(Toast::error(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Persist a freshly issued session.
    fn establish(&self, response: AuthResponse) -> Result<AuthSession, AuthError> {
        let local = self.api.local_storage();
        local.set(keys::TOKEN, &response.token)?;
        if let Err(e) = write_json(local.as_ref(), keys::USER, &response.user) {
            warn!(error = %e, "Failed to store profile, rolling back token");
            let _ = local.remove(keys::TOKEN);
            return Err(e.into());
        }
        set_sentry_user(&response.user.id, Some(response.user.email.as_str()));
        add_breadcrumb("auth", "Logged in", Some(&[("user_id", response.user.id.as_str())]));
        info!(user_id = %response.user.id, "Customer session established");

        Ok(AuthSession {
            token: SecretString::from(response.token),
            user: response.user,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ClientConfig;
    use crate::notify::ToastLog;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn store() -> (AuthStore, Arc<MemoryStore>, Arc<ToastLog>) {
        let local = Arc::new(MemoryStore::new());
        let log = Arc::new(ToastLog::new());
        // Port 9 (discard) so any accidental request fails fast.
        let config = ClientConfig::new(url::Url::parse("http://127.0.0.1:9").unwrap());
        let api = ApiClient::new(&config, local.clone()).unwrap();
        (AuthStore::new(api, log.clone()), local, log)
    }

    fn form(password: &str, confirm: &str) -> Registration {
        Registration {
            name: "Asha".to_string(),
            email: "asha@example.in".to_string(),
            password: SecretString::from(password),
            confirm_password: SecretString::from(confirm),
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(form("secret1", "secret1").validate().is_ok());
        assert!(matches!(
            form("secret1", "secret2").validate(),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(form("abc", "abc").validate(), Err(AuthError::WeakPassword)));

        let mut nameless = form("secret1", "secret1");
        nameless.name = "  ".to_string();
        assert!(matches!(nameless.validate(), Err(AuthError::MissingField("Name"))));
    }

    #[tokio::test]
    async fn test_register_mismatch_never_hits_network() {
        let (auth, local, log) = store();
        let err = auth.register(&form("secret1", "other12")).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
        assert!(log.contains("Passwords do not match"));
        assert_eq!(local.get(keys::TOKEN), None);
    }

    #[tokio::test]
    async fn test_login_rejects_invalid_email_locally() {
        let (auth, _, log) = store();
        let err = auth
            .login("not-an-email", &SecretString::from("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
        assert!(log.contains("Please enter a valid email"));
    }

    #[test]
    fn test_session_requires_token_and_profile() {
        let (auth, local, _) = store();
        assert!(auth.session().is_none());

        local.set(keys::TOKEN, "tok").unwrap();
        assert!(auth.is_authenticated());
        assert!(auth.session().is_none());

        local
            .set(keys::USER, r#"{"_id":"u1","name":"Asha","email":"asha@example.in"}"#)
            .unwrap();
        let session = auth.session().unwrap();
        assert_eq!(session.user.id, UserId::new("u1"));
        assert_eq!(auth.user_id(), Some(UserId::new("u1")));
        assert!(!format!("{session:?}").contains("tok\""));
    }

    #[test]
    fn test_logout_clears_session() {
        let (auth, local, _) = store();
        local.set(keys::TOKEN, "tok").unwrap();
        local.set(keys::USER, "{}").unwrap();
        auth.logout().unwrap();
        assert_eq!(local.get(keys::TOKEN), None);
        assert_eq!(local.get(keys::USER), None);
    }
}
