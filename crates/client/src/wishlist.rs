//! Wishlist store.
//!
//! Holds the set of favorited product ids. The set is not fetched eagerly;
//! it is replaced by whatever id list the last wishlist response carried.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use shopfront_core::ProductId;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::api::{ApiClient, ApiError, Credential};
use crate::error::add_breadcrumb;
use crate::notify::{SharedNotifier, Toast};

/// Errors from wishlist operations.
#[derive(Debug, Error)]
pub enum WishlistError {
    /// The wishlist belongs to a customer account.
    #[error("Please login to use your wishlist")]
    NotAuthenticated,

    /// The backend rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Server wishlist operations used by [`WishlistStore`].
pub trait WishlistBackend: Send + Sync {
    /// Whether a customer session exists.
    fn is_authenticated(&self) -> bool;

    /// Fetch the id list.
    fn fetch(&self) -> impl Future<Output = Result<Vec<ProductId>, ApiError>> + Send;

    /// Add a product, returning the new id list.
    fn add(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Vec<ProductId>, ApiError>> + Send;

    /// Remove a product, returning the new id list.
    fn remove(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Vec<ProductId>, ApiError>> + Send;
}

impl WishlistBackend for ApiClient {
    fn is_authenticated(&self) -> bool {
        self.has_token(Credential::Customer)
    }

    fn fetch(&self) -> impl Future<Output = Result<Vec<ProductId>, ApiError>> + Send {
        self.wishlist()
    }

    fn add(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Vec<ProductId>, ApiError>> + Send {
        self.wishlist_add(product_id)
    }

    fn remove(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Vec<ProductId>, ApiError>> + Send {
        self.wishlist_remove(product_id)
    }
}

/// The customer's wishlist ids.
pub struct WishlistStore<B> {
    backend: B,
    notifier: SharedNotifier,
    ids: RwLock<BTreeSet<ProductId>>,
}

impl<B: WishlistBackend> WishlistStore<B> {
    /// Create an empty store.
    pub fn new(backend: B, notifier: SharedNotifier) -> Self {
        Self {
            backend,
            notifier,
            ids: RwLock::new(BTreeSet::new()),
        }
    }

    /// Whether the product is on the wishlist.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(product_id)
    }

    /// Current ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Replace the set with ids from a server response.
    pub fn absorb(&self, ids: impl IntoIterator<Item = ProductId>) {
        *self.ids.write().unwrap_or_else(PoisonError::into_inner) = ids.into_iter().collect();
    }

    /// Forget all ids (e.g., on logout).
    pub fn clear(&self) {
        self.ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Fetch the wishlist from the server.
    ///
    /// # Errors
    ///
    /// Returns an error if no session exists or the request fails.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<ProductId>, WishlistError> {
        if !self.backend.is_authenticated() {
            return Err(WishlistError::NotAuthenticated);
        }
        let ids = self.backend.fetch().await?;
        self.absorb(ids);
        Ok(self.ids())
    }

    /// Add the product if absent, remove it if present.
    ///
    /// Returns whether the product is on the wishlist afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if no session exists or the request fails; the set
    /// is then unchanged.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle(&self, product_id: &ProductId) -> Result<bool, WishlistError> {
        if !self.backend.is_authenticated() {
            self.notifier
                .notify(Toast::error("Please login to add items to wishlist"));
            return Err(WishlistError::NotAuthenticated);
        }

        let removing = self.contains(product_id);
        let result = if removing {
            self.backend.remove(product_id).await
        } else {
            self.backend.add(product_id).await
        };

        match result {
            Ok(ids) => {
                self.absorb(ids);
                let message = if removing {
                    "Removed from wishlist"
                } else {
                    "Added to wishlist"
                };
                add_breadcrumb("wishlist", message, Some(&[("product_id", product_id.as_str())]));
                self.notifier.notify(Toast::success(message));
                Ok(self.contains(product_id))
            }
            Err(e) => {
                warn!(error = %e, "Wishlist update failed");
                self.notifier.notify(Toast::error(e.user_message()));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::notify::ToastLog;

    #[derive(Default)]
    struct FakeWishlist {
        authenticated: bool,
        server: Mutex<Vec<ProductId>>,
        fail: Mutex<Option<ApiError>>,
    }

    impl FakeWishlist {
        fn take_failure(&self) -> Result<(), ApiError> {
            self.fail.lock().unwrap().take().map_or(Ok(()), Err)
        }
    }

    impl WishlistBackend for Arc<FakeWishlist> {
        fn is_authenticated(&self) -> bool {
            self.authenticated
        }

        async fn fetch(&self) -> Result<Vec<ProductId>, ApiError> {
            self.take_failure()?;
            Ok(self.server.lock().unwrap().clone())
        }

        async fn add(&self, product_id: &ProductId) -> Result<Vec<ProductId>, ApiError> {
            self.take_failure()?;
            let mut server = self.server.lock().unwrap();
            server.push(product_id.clone());
            Ok(server.clone())
        }

        async fn remove(&self, product_id: &ProductId) -> Result<Vec<ProductId>, ApiError> {
            self.take_failure()?;
            let mut server = self.server.lock().unwrap();
            server.retain(|id| id != product_id);
            Ok(server.clone())
        }
    }

    type Fixture = (WishlistStore<Arc<FakeWishlist>>, Arc<FakeWishlist>, Arc<ToastLog>);

    fn store(authenticated: bool) -> Fixture {
        let backend = Arc::new(FakeWishlist {
            authenticated,
            ..FakeWishlist::default()
        });
        let log = Arc::new(ToastLog::new());
        (WishlistStore::new(backend.clone(), log.clone()), backend, log)
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes() {
        let (wishlist, _, log) = store(true);
        let id = ProductId::new("p1");

        assert!(wishlist.toggle(&id).await.unwrap());
        assert!(wishlist.contains(&id));
        assert!(log.contains("Added to wishlist"));

        assert!(!wishlist.toggle(&id).await.unwrap());
        assert!(!wishlist.contains(&id));
        assert!(log.contains("Removed from wishlist"));
    }

    #[tokio::test]
    async fn test_set_replaced_by_server_response() {
        let (wishlist, backend, _) = store(true);
        backend.server.lock().unwrap().push(ProductId::new("elsewhere"));

        wishlist.toggle(&ProductId::new("p1")).await.unwrap();
        assert_eq!(
            wishlist.ids(),
            vec![ProductId::new("elsewhere"), ProductId::new("p1")]
        );
    }

    #[tokio::test]
    async fn test_guest_toggle_requires_login() {
        let (wishlist, _, log) = store(false);
        let err = wishlist.toggle(&ProductId::new("p1")).await.unwrap_err();
        assert!(matches!(err, WishlistError::NotAuthenticated));
        assert!(log.contains("Please login to add items to wishlist"));
        assert!(matches!(wishlist.load().await, Err(WishlistError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_failed_toggle_keeps_set() {
        let (wishlist, backend, log) = store(true);
        wishlist.absorb([ProductId::new("p1")]);
        *backend.fail.lock().unwrap() = Some(ApiError::Status {
            status: 404,
            message: "Product not found".to_string(),
        });

        assert!(wishlist.toggle(&ProductId::new("p1")).await.is_err());
        assert!(wishlist.contains(&ProductId::new("p1")));
        assert!(log.contains("Product not found"));
    }
}
