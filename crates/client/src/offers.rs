//! Promotional offer interstitial.
//!
//! After mount the controller waits (3 s by default), fetches the active
//! offers and shows the first live one whose id is not yet in the
//! session-scoped `seenOffers` list. Shown offers are added to that list, so
//! each offer appears at most once per session. Admin routes never show an
//! offer.
//!
//! For manual testing the check can be forced (ignoring the seen list)
//! through an [`OfferTrigger`] handle or the `Ctrl+Shift+O` chord.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use chrono::Utc;
use shopfront_core::OfferId;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError, Offer};
use crate::storage::{SharedStore, keys, read_json, write_json};
use crate::timer::DelayedTask;

/// Route prefix of the back office.
const ADMIN_ROUTE: &str = "/admin";

/// Source of active offers.
pub trait OfferSource: Send + Sync + 'static {
    /// Fetch the currently active offers.
    fn active_offers(&self) -> impl Future<Output = Result<Vec<Offer>, ApiError>> + Send;
}

impl OfferSource for ApiClient {
    fn active_offers(&self) -> impl Future<Output = Result<Vec<Offer>, ApiError>> + Send {
        ApiClient::active_offers(self)
    }
}

/// Whether `path` belongs to the back office.
#[must_use]
pub fn is_admin_route(path: &str) -> bool {
    path.strip_prefix(ADMIN_ROUTE)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// A key press as seen by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub ctrl: bool,
    pub shift: bool,
    pub key: char,
}

impl KeyChord {
    /// The chord that forces the offer check.
    #[must_use]
    pub const fn is_offer_trigger(self) -> bool {
        self.ctrl && self.shift && self.key.eq_ignore_ascii_case(&'o')
    }
}

// =============================================================================
// OfferModal
// =============================================================================

/// Offer interstitial controller.
///
/// Dropping the controller cancels a pending delayed check.
pub struct OfferModal<S> {
    inner: Arc<ModalInner<S>>,
    pending: Mutex<Option<DelayedTask>>,
}

struct ModalInner<S> {
    source: S,
    session: SharedStore,
    delay: Duration,
    route: RwLock<String>,
    shown: watch::Sender<Option<Offer>>,
}

impl<S: OfferSource> OfferModal<S> {
    /// Create a controller. `session` is the session-scoped store holding
    /// the seen list.
    #[must_use]
    pub fn new(source: S, session: SharedStore, delay: Duration) -> Self {
        let (shown, _) = watch::channel(None);
        Self {
            inner: Arc::new(ModalInner {
                source,
                session,
                delay,
                route: RwLock::new("/".to_string()),
                shown,
            }),
            pending: Mutex::new(None),
        }
    }

    /// Schedule the delayed check for the current route.
    ///
    /// Replaces any check already pending. Does nothing on admin routes.
    /// Must be called from within a tokio runtime.
    pub fn mount(&self) {
        if is_admin_route(&self.inner.route()) {
            debug!("Offer modal suppressed on admin route");
            return;
        }
        let inner = self.inner.clone();
        let task = DelayedTask::schedule(self.inner.delay, async move {
            inner.check(false).await;
        });
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    /// Cancel a pending check and hide the modal.
    pub fn unmount(&self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.inner.shown.send_replace(None);
    }

    /// Record a navigation. Entering the back office cancels a pending
    /// check and hides the modal.
    pub fn set_route(&self, path: &str) {
        *self
            .inner
            .route
            .write()
            .unwrap_or_else(PoisonError::into_inner) = path.to_string();
        if is_admin_route(path) {
            self.unmount();
        }
    }

    /// Run the check now, ignoring the seen list.
    pub async fn force_check(&self) -> Option<Offer> {
        self.inner.check(true).await
    }

    /// A cloneable handle that forces the check from anywhere.
    #[must_use]
    pub fn trigger(&self) -> OfferTrigger<S> {
        OfferTrigger {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Handle a key press. Returns whether the chord was consumed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn handle_key(&self, chord: KeyChord) -> bool {
        if !chord.is_offer_trigger() {
            return false;
        }
        info!("Offer modal triggered from keyboard");
        self.trigger().fire();
        true
    }

    /// Close the modal.
    pub fn dismiss(&self) {
        if let Some(offer) = self.inner.shown.send_replace(None) {
            debug!(offer_id = %offer.id, "Offer dismissed");
        }
    }

    /// The offer currently shown.
    #[must_use]
    pub fn current(&self) -> Option<Offer> {
        self.inner.shown.borrow().clone()
    }

    /// Watch the shown offer.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Offer>> {
        self.inner.shown.subscribe()
    }

    /// Ids already shown this session.
    #[must_use]
    pub fn seen(&self) -> Vec<OfferId> {
        self.inner.seen()
    }
}

impl<S: OfferSource> ModalInner<S> {
    fn route(&self) -> String {
        self.route
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn seen(&self) -> Vec<OfferId> {
        read_json(self.session.as_ref(), keys::SEEN_OFFERS).unwrap_or_default()
    }

    fn mark_seen(&self, id: &OfferId) {
        let mut seen = self.seen();
        if seen.contains(id) {
            return;
        }
        seen.push(id.clone());
        if let Err(e) = write_json(self.session.as_ref(), keys::SEEN_OFFERS, &seen) {
            warn!(error = %e, "Failed to record seen offer");
        }
    }

    async fn check(&self, force: bool) -> Option<Offer> {
        if is_admin_route(&self.route()) {
            return None;
        }

        let offers = match self.source.active_offers().await {
            Ok(offers) => offers,
            Err(e) if e.is_unauthorized() => {
                error!(
                    error = %e,
                    "Active offers endpoint demanded authentication; it should be public"
                );
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch active offers");
                return None;
            }
        };

        let now = Utc::now();
        let seen = if force { Vec::new() } else { self.seen() };
        let offer = offers
            .into_iter()
            .find(|offer| offer.is_live(now) && !seen.contains(&offer.id))?;

        self.mark_seen(&offer.id);
        info!(offer_id = %offer.id, forced = force, "Showing offer");
        self.shown.send_replace(Some(offer.clone()));
        Some(offer)
    }
}

/// Handle that forces the offer check, like a global event.
pub struct OfferTrigger<S> {
    inner: Weak<ModalInner<S>>,
}

impl<S> Clone for OfferTrigger<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: OfferSource> OfferTrigger<S> {
    /// Force the check in the background. No-op once the controller is gone.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fire(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            inner.check(true).await;
        });
    }
}
