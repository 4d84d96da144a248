//! Admin session lifecycle.
//!
//! The admin token lives in local storage under `admin_token`, separate
//! from the customer token. The pending-order poller runs exactly while a
//! session is active: it starts on login (or on [`AdminSession::resume`]
//! when a token is already stored) and is aborted on logout.

use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use secrecy::SecretString;
use shopfront_client::api::ApiError;
use shopfront_client::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use shopfront_client::storage::{StorageError, keys};
use shopfront_core::{Email, EmailError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::api::{AdminApi, AdminProfile};
use crate::poller::{PendingOrderPoller, PendingOrders};

/// Errors raised by the admin session.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("admin login required")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A signed-in (or signed-out) administrator.
#[derive(Debug)]
pub struct AdminSession {
    api: AdminApi,
    poll_interval: Duration,
    profile: RwLock<Option<AdminProfile>>,
    poller: Mutex<Option<PendingOrderPoller>>,
}

impl AdminSession {
    /// Create a signed-out session.
    #[must_use]
    pub const fn new(api: AdminApi, poll_interval: Duration) -> Self {
        Self {
            api,
            poll_interval,
            profile: RwLock::new(None),
            poller: Mutex::new(None),
        }
    }

    /// The admin endpoints.
    #[must_use]
    pub const fn api(&self) -> &AdminApi {
        &self.api
    }

    /// Whether an admin token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.api.has_token()
    }

    /// The admin that logged in through this session, if any.
    #[must_use]
    pub fn profile(&self) -> Option<AdminProfile> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sign in, store the token and start the pending-order poller.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is malformed (no request is made), the
    /// credentials are rejected or the token cannot be stored.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AdminProfile, AdminError> {
        let email = Email::parse(email)?;
        let response = self.api.login(&email, password).await?;

        self.api
            .client()
            .local_storage()
            .set(keys::ADMIN_TOKEN, &response.token)?;

        set_sentry_user(&response.admin.id, Some(response.admin.email.as_str()));
        add_breadcrumb("admin", "Admin logged in", None);
        info!(admin_id = %response.admin.id, "Admin logged in");

        *self.profile.write().unwrap_or_else(PoisonError::into_inner) =
            Some(response.admin.clone());
        self.start_poller();
        Ok(response.admin)
    }

    /// Start polling for a token stored by an earlier run.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::NotAuthenticated`] if no token is stored.
    pub fn resume(&self) -> Result<(), AdminError> {
        if !self.is_authenticated() {
            return Err(AdminError::NotAuthenticated);
        }
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if poller.as_ref().is_none_or(|p| !p.is_running()) {
            *poller = Some(PendingOrderPoller::spawn(self.api.clone(), self.poll_interval));
        }
        Ok(())
    }

    /// Sign out: drop the token and stop polling.
    pub fn logout(&self) {
        self.stop_poller();
        if let Err(e) = self.api.client().local_storage().remove(keys::ADMIN_TOKEN) {
            warn!(error = %e, "Failed to remove admin token");
        }
        self.profile
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        clear_sentry_user();
        add_breadcrumb("admin", "Admin logged out", None);
        info!("Admin logged out");
    }

    /// Current badge state, or `None` while signed out.
    #[must_use]
    pub fn pending_orders(&self) -> Option<PendingOrders> {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(PendingOrderPoller::current)
    }

    /// Watch the badge state, or `None` while signed out.
    #[must_use]
    pub fn subscribe_pending(&self) -> Option<watch::Receiver<PendingOrders>> {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(PendingOrderPoller::subscribe)
    }

    /// Forward a navigation to the poller.
    pub fn on_navigate(&self, path: &str) {
        if let Some(poller) = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            poller.on_navigate(path);
        }
    }

    /// Whether the poller is currently running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(PendingOrderPoller::is_running)
    }

    fn start_poller(&self) {
        let poller = PendingOrderPoller::spawn(self.api.clone(), self.poll_interval);
        // Replacing drops, and so aborts, any previous poller.
        *self.poller.lock().unwrap_or_else(PoisonError::into_inner) = Some(poller);
    }

    fn stop_poller(&self) {
        if let Some(poller) = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            poller.stop();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_client::ClientConfig;
    use shopfront_client::api::ApiClient;
    use shopfront_client::storage::MemoryStore;

    use super::*;

    fn session() -> AdminSession {
        let config = ClientConfig::new("http://127.0.0.1:9".parse().unwrap());
        let client = ApiClient::new(&config, MemoryStore::shared()).unwrap();
        AdminSession::new(AdminApi::new(client), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_invalid_email_makes_no_request() {
        let session = session();
        let err = session
            .login("not-an-email", &SecretString::from("secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidEmail(_)));
        assert!(!session.is_polling());
    }

    #[tokio::test]
    async fn test_resume_requires_token() {
        let session = session();
        assert!(matches!(session.resume(), Err(AdminError::NotAuthenticated)));
        assert!(session.pending_orders().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_then_logout_stops_poller() {
        let session = session();
        session
            .api()
            .client()
            .local_storage()
            .set(keys::ADMIN_TOKEN, "stored")
            .unwrap();

        session.resume().unwrap();
        assert!(session.pending_orders().is_some());

        session.logout();
        assert!(!session.is_authenticated());
        assert!(!session.is_polling());
        assert!(session.pending_orders().is_none());
    }
}
