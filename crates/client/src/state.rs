//! Explicit storefront state container.
//!
//! Builds the client and every store once, wired to the same storage areas
//! and notifier, and hands them out by reference. Nothing here is global:
//! two `Storefront`s over different state directories are fully independent.

use std::sync::Arc;

use shopfront_core::ProductId;
use tracing::info;

use crate::api::ApiClient;
use crate::auth::AuthStore;
use crate::cart::CartStore;
use crate::catalog::{Catalog, ProductSearch};
use crate::checkout::Checkout;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::notify::{SharedNotifier, TracingNotifier};
use crate::offers::OfferModal;
use crate::reviews::ReviewsPanel;
use crate::storage::{FileStore, MemoryStore, SharedStore};
use crate::wishlist::WishlistStore;

/// Everything a storefront front end needs.
#[derive(Clone)]
pub struct Storefront {
    config: ClientConfig,
    api: ApiClient,
    session: SharedStore,
    notifier: SharedNotifier,
    auth: AuthStore,
    cart: Arc<CartStore<ApiClient>>,
    wishlist: Arc<WishlistStore<ApiClient>>,
    catalog: Catalog,
    checkout: Checkout,
}

impl Storefront {
    /// Open the storefront with local storage persisted under the
    /// configured state directory, a fresh session store, and toasts routed
    /// to the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the local storage file cannot be read or the HTTP
    /// client fails to build.
    pub fn open(config: ClientConfig) -> Result<Self, ClientError> {
        let local: SharedStore = Arc::new(FileStore::open(config.local_storage_path())?);
        Self::with_stores(config, local, MemoryStore::shared(), Arc::new(TracingNotifier))
    }

    /// Build the storefront over explicit storage areas and notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_stores(
        config: ClientConfig,
        local: SharedStore,
        session: SharedStore,
        notifier: SharedNotifier,
    ) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config, local.clone())?;
        let cart = Arc::new(CartStore::new(api.clone(), local, notifier.clone()));
        let checkout = Checkout::new(api.clone(), cart.clone(), notifier.clone(), config.currency);
        info!(api = %config.api_root(), "Storefront ready");

        Ok(Self {
            auth: AuthStore::new(api.clone(), notifier.clone()),
            wishlist: Arc::new(WishlistStore::new(api.clone(), notifier.clone())),
            catalog: Catalog::new(api.clone(), config.catalog_ttl),
            cart,
            checkout,
            api,
            session,
            notifier,
            config,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The REST client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Customer session.
    #[must_use]
    pub const fn auth(&self) -> &AuthStore {
        &self.auth
    }

    /// The cart.
    #[must_use]
    pub fn cart(&self) -> &CartStore<ApiClient> {
        &self.cart
    }

    /// The wishlist.
    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore<ApiClient> {
        &self.wishlist
    }

    /// The product catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Checkout and orders.
    #[must_use]
    pub const fn checkout(&self) -> &Checkout {
        &self.checkout
    }

    /// A new offer interstitial controller bound to the session store.
    #[must_use]
    pub fn offer_modal(&self) -> OfferModal<ApiClient> {
        OfferModal::new(self.api.clone(), self.session.clone(), self.config.offer_delay)
    }

    /// A reviews panel for one product.
    #[must_use]
    pub fn reviews(&self, product_id: ProductId) -> ReviewsPanel<ApiClient> {
        ReviewsPanel::new(self.api.clone(), self.notifier.clone(), product_id)
    }

    /// A debounced search box over the catalog.
    #[must_use]
    pub fn search(&self) -> ProductSearch {
        ProductSearch::new(self.catalog.clone(), self.config.search_debounce)
    }

    /// Sign out and drop per-customer state. The guest cart is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.auth.logout()?;
        self.wishlist.clear();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notify::ToastLog;
    use crate::storage::keys;

    #[test]
    fn test_open_uses_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::new(url::Url::parse("http://127.0.0.1:9").unwrap());
        config.state_dir = dir.path().to_path_buf();

        let storefront = Storefront::open(config.clone()).unwrap();
        storefront.api().local_storage().set(keys::TOKEN, "t").unwrap();
        assert!(config.local_storage_path().exists());
        assert!(storefront.auth().is_authenticated());

        storefront.logout().unwrap();
        assert!(!storefront.auth().is_authenticated());
    }

    #[test]
    fn test_stores_share_storage() {
        let local = MemoryStore::shared();
        let config = ClientConfig::new(url::Url::parse("http://127.0.0.1:9").unwrap());
        let storefront = Storefront::with_stores(
            config,
            local.clone(),
            MemoryStore::shared(),
            Arc::new(ToastLog::new()),
        )
        .unwrap();

        local.set(keys::TOKEN, "t").unwrap();
        assert!(storefront.auth().is_authenticated());
        assert!(storefront.api().has_token(crate::api::Credential::Customer));
        assert!(storefront.cart().is_empty());
    }
}
