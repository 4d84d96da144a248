//! Shopping cart store.
//!
//! The local cart is the source of truth for display; the server cart is the
//! source of truth for stock. With a customer session every confirming
//! mutation (add, update) waits for the backend before touching local state.
//! Guests mutate locally only.
//!
//! Add, update and sync report a failed server mutation as a [`CartError`]
//! carrying the [`Reconciliation`] that was applied. Remove and clear are
//! best effort: a server failure is logged, the server cart is refetched,
//! and the reconciled lines are returned as success. A line the server
//! still holds therefore comes back after a failed remove.
//!
//! | Operation           | Local step     | On backend failure                  |
//! |---------------------|----------------|-------------------------------------|
//! | `add_item`          | after backend  | error, unchanged                    |
//! | `update_quantity`   | after backend  | error, refetch server cart          |
//! | `remove_item`       | before backend | logged, refetch server cart         |
//! | `clear_cart`        | before backend | logged, refetch server cart         |
//! | `sync_with_backend` | none           | error, unchanged (partial server)   |
//!
//! Lines are keyed by `(product_id, size)`. State is persisted to the
//! `cart-storage` local storage key after every change and rehydrated on
//! construction.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use shopfront_core::{Price, ProductId};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ApiError, Credential, Product, ServerCart};
use crate::error::add_breadcrumb;
use crate::notify::{SharedNotifier, Toast};
use crate::storage::{SharedStore, keys, read_json, write_json};

/// Version written into the persisted cart envelope.
const CART_STORAGE_VERSION: u32 = 0;

// =============================================================================
// Types
// =============================================================================

/// One (product, size) line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "selectedSize")]
    pub size: String,
    pub quantity: u32,
    /// Stock at the time the line was added. Informational only.
    #[serde(default)]
    pub stock: u32,
}

impl CartItem {
    /// A new line with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product, size: &str) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image().to_string(),
            category: product.category.clone(),
            size: size.to_string(),
            quantity: 1,
            stock: product.stock,
        }
    }

    /// Whether this line is the given (product, size) pair.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, size: &str) -> bool {
        self.product_id == *product_id && self.size == size
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// How local state was reconciled after a failed server mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Local state was left as it stood after the local step (if any).
    Unchanged,
    /// Local state was replaced wholesale by the refetched server cart.
    Refetched,
}

/// A cart mutation rejected by the backend.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct CartError {
    pub source: ApiError,
    pub reconciliation: Reconciliation,
}

impl CartError {
    /// The message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.source.user_message()
    }
}

/// Persisted form of the cart (`{"state":{"items":[...]},"version":0}`).
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedCart {
    state: PersistedCartState,
    #[serde(default)]
    version: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedCartState {
    #[serde(default)]
    items: Vec<CartItem>,
}

// =============================================================================
// Backend seam
// =============================================================================

/// Server cart operations used by [`CartStore`].
pub trait CartBackend: Send + Sync {
    /// Whether a customer session exists. Without one the cart is local-only.
    fn is_authenticated(&self) -> bool;

    /// Add `quantity` of a product size to the server cart.
    fn add(
        &self,
        product_id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<ServerCart, ApiError>> + Send;

    /// Set the quantity of a server cart line.
    fn update(
        &self,
        product_id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<ServerCart, ApiError>> + Send;

    /// Remove a server cart line.
    fn remove(
        &self,
        product_id: &ProductId,
        size: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Empty the server cart.
    fn clear(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Fetch the server cart.
    fn fetch(&self) -> impl Future<Output = Result<ServerCart, ApiError>> + Send;
}

impl CartBackend for ApiClient {
    fn is_authenticated(&self) -> bool {
        self.has_token(Credential::Customer)
    }

    fn add(
        &self,
        product_id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<ServerCart, ApiError>> + Send {
        self.cart_add(product_id, size, quantity)
    }

    fn update(
        &self,
        product_id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> impl Future<Output = Result<ServerCart, ApiError>> + Send {
        self.cart_update(product_id, size, quantity)
    }

    fn remove(
        &self,
        product_id: &ProductId,
        size: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.cart_remove(product_id, size)
    }

    fn clear(&self) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.cart_clear()
    }

    fn fetch(&self) -> impl Future<Output = Result<ServerCart, ApiError>> + Send {
        self.cart()
    }
}

/// Convert the server cart into local lines, dropping lines whose product
/// no longer exists.
#[must_use]
pub fn items_from_server(cart: ServerCart) -> Vec<CartItem> {
    cart.items
        .into_iter()
        .filter_map(|line| {
            let product = line.product?;
            let mut item = CartItem::from_product(&product, &line.size);
            item.quantity = line.quantity;
            Some(item)
        })
        .filter(|item| item.quantity > 0)
        .collect()
}

// =============================================================================
// CartStore
// =============================================================================

/// The session's cart.
pub struct CartStore<B> {
    backend: B,
    local: SharedStore,
    notifier: SharedNotifier,
    items: RwLock<Vec<CartItem>>,
    /// Serializes mutations so each one observes the previous one's result.
    ops: tokio::sync::Mutex<()>,
}

impl<B> std::fmt::Debug for CartStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("CartStore")
            .field("items", &*items)
            .finish_non_exhaustive()
    }
}

impl<B: CartBackend> CartStore<B> {
    /// Create the store, rehydrating any cart persisted in `local`.
    pub fn new(backend: B, local: SharedStore, notifier: SharedNotifier) -> Self {
        let items = read_json::<PersistedCart>(local.as_ref(), keys::CART)
            .map(|persisted| persisted.state.items)
            .unwrap_or_default();
        debug!(lines = items.len(), "Rehydrated cart");

        Self {
            backend,
            local,
            notifier,
            items: RwLock::new(items),
            ops: tokio::sync::Mutex::new(()),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Snapshot of the cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The line for a (product, size) pair.
    #[must_use]
    pub fn item(&self, product_id: &ProductId, size: &str) -> Option<CartItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|item| item.matches(product_id, size))
            .cloned()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|item| item.quantity)
            .sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(CartItem::line_total)
            .sum()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product size.
    ///
    /// With a session the backend validates stock first; local state changes
    /// only if it accepts.
    ///
    /// # Errors
    ///
    /// Returns the backend rejection (e.g., "Out of stock") with
    /// [`Reconciliation::Unchanged`].
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(&self, product: &Product, size: &str) -> Result<Vec<CartItem>, CartError> {
        let _guard = self.ops.lock().await;

        if self.backend.is_authenticated()
            && let Err(source) = self.backend.add(&product.id, size, 1).await
        {
            warn!(error = %source, "Backend rejected add to cart");
            self.notifier.notify(Toast::error(source.user_message()));
            return Err(CartError {
                source,
                reconciliation: Reconciliation::Unchanged,
            });
        }

        let items = self.mutate(|items| {
            if let Some(existing) = items.iter_mut().find(|i| i.matches(&product.id, size)) {
                existing.quantity = existing.quantity.saturating_add(1);
            } else {
                items.push(CartItem::from_product(product, size));
            }
        });
        add_breadcrumb(
            "cart",
            "Added item",
            Some(&[("product_id", product.id.as_str()), ("size", size)]),
        );
        self.notifier.notify(Toast::success("Added to cart"));
        Ok(items)
    }

    /// Remove a line.
    ///
    /// The line disappears locally at once; the server removal is best
    /// effort and is never surfaced to the user. If it fails, local state is
    /// replaced by the refetched server cart and that snapshot is returned.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId, size: &str) -> Vec<CartItem> {
        let _guard = self.ops.lock().await;
        self.remove_locked(product_id, size).await
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns the backend rejection of a positive quantity. Local state is
    /// then replaced by the server cart ([`Reconciliation::Refetched`]), or
    /// left unchanged if that refetch also fails. Removal through a zero
    /// quantity is best effort and never fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        size: &str,
        quantity: i64,
    ) -> Result<Vec<CartItem>, CartError> {
        let _guard = self.ops.lock().await;

        if quantity <= 0 {
            return Ok(self.remove_locked(product_id, size).await);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        if self.backend.is_authenticated()
            && let Err(source) = self.backend.update(product_id, size, quantity).await
        {
            warn!(error = %source, "Backend rejected quantity update, resyncing cart");
            self.notifier.notify(Toast::error(source.user_message()));
            let reconciliation = self.reconcile().await;
            return Err(CartError {
                source,
                reconciliation,
            });
        }

        let items = self.mutate(|items| {
            if let Some(existing) = items.iter_mut().find(|i| i.matches(product_id, size)) {
                existing.quantity = quantity;
            }
        });
        Ok(items)
    }

    /// Empty the cart locally and, best effort, on the server.
    ///
    /// A server failure is logged and local state is replaced by the
    /// refetched server cart, which is returned.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Vec<CartItem> {
        let _guard = self.ops.lock().await;

        let items = self.mutate(Vec::clear);
        add_breadcrumb("cart", "Cleared cart", None);

        if self.backend.is_authenticated()
            && let Err(source) = self.backend.clear().await
        {
            warn!(error = %source, "Failed to clear server cart");
            return self.reconcile_snapshot().await;
        }
        items
    }

    /// Replace the server cart with the local one.
    ///
    /// Clears the server cart, then replays every local line through the add
    /// endpoint one at a time. Used before checkout. Guests are a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Lines replayed before it stay on the
    /// server; local state is not touched.
    #[instrument(skip(self))]
    pub async fn sync_with_backend(&self) -> Result<(), CartError> {
        let _guard = self.ops.lock().await;

        if !self.backend.is_authenticated() {
            return Ok(());
        }

        let fail = |source: ApiError| {
            warn!(error = %source, "Cart sync failed");
            self.notifier
                .notify(Toast::error(format!("Failed to sync cart: {}", source.user_message())));
            CartError {
                source,
                reconciliation: Reconciliation::Unchanged,
            }
        };

        self.backend.clear().await.map_err(fail)?;
        let items = self.items();
        for item in &items {
            self.backend
                .add(&item.product_id, &item.size, item.quantity)
                .await
                .map_err(fail)?;
        }
        info!(lines = items.len(), "Synced cart with backend");
        Ok(())
    }

    /// Replace local state with the server cart.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure; local state is then unchanged.
    pub async fn refresh(&self) -> Result<Vec<CartItem>, ApiError> {
        let _guard = self.ops.lock().await;
        let cart = self.backend.fetch().await?;
        Ok(self.replace(items_from_server(cart)))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn remove_locked(&self, product_id: &ProductId, size: &str) -> Vec<CartItem> {
        let items = self.mutate(|items| items.retain(|i| !i.matches(product_id, size)));
        add_breadcrumb(
            "cart",
            "Removed item",
            Some(&[("product_id", product_id.as_str()), ("size", size)]),
        );

        if self.backend.is_authenticated()
            && let Err(source) = self.backend.remove(product_id, size).await
        {
            warn!(error = %source, "Failed to remove line from server cart");
            return self.reconcile_snapshot().await;
        }
        items
    }

    /// Reconcile after a best-effort mutation and return the lines.
    async fn reconcile_snapshot(&self) -> Vec<CartItem> {
        let reconciliation = self.reconcile().await;
        debug!(?reconciliation, "Best-effort cart mutation reconciled");
        self.items()
    }

    /// Pull the server cart after a failed mutation.
    async fn reconcile(&self) -> Reconciliation {
        match self.backend.fetch().await {
            Ok(cart) => {
                let items = self.replace(items_from_server(cart));
                info!(lines = items.len(), "Cart resynced from server");
                Reconciliation::Refetched
            }
            Err(e) => {
                warn!(error = %e, "Cart resync failed, keeping local state");
                Reconciliation::Unchanged
            }
        }
    }

    fn replace(&self, items: Vec<CartItem>) -> Vec<CartItem> {
        self.mutate(move |current| *current = items)
    }

    /// Apply `f` to the lines, persist, and return the new snapshot.
    fn mutate(&self, f: impl FnOnce(&mut Vec<CartItem>)) -> Vec<CartItem> {
        let snapshot = {
            let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut items);
            items.clone()
        };
        self.persist(&snapshot);
        snapshot
    }

    fn persist(&self, items: &[CartItem]) {
        let envelope = PersistedCart {
            state: PersistedCartState {
                items: items.to_vec(),
            },
            version: CART_STORAGE_VERSION,
        };
        if let Err(e) = write_json(self.local.as_ref(), keys::CART, &envelope) {
            warn!(error = %e, "Failed to persist cart");
        }
    }
}
