//! Server-side cart endpoints.
//!
//! These are the raw calls; consistency with the local cart is handled by
//! [`crate::cart::CartStore`].

use serde::de::IgnoredAny;
use shopfront_core::ProductId;
use tracing::instrument;

use super::{ApiClient, ApiError, CartLineRequest, CartPayload, Credential, ServerCart, SizeQuery};

impl ApiClient {
    /// Add `quantity` of a product size to the server cart.
    ///
    /// The backend validates stock and rejects the call when insufficient.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the line or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn cart_add(
        &self,
        product_id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<ServerCart, ApiError> {
        let body = CartLineRequest {
            product_id,
            quantity,
            size,
        };
        let payload: CartPayload = self.post("/cart/add", &body, Credential::Customer).await?;
        Ok(payload.into())
    }

    /// Fetch the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn cart(&self) -> Result<ServerCart, ApiError> {
        let payload: CartPayload = self.get("/cart", Credential::Customer).await?;
        Ok(payload.into())
    }

    /// Set the quantity of a line in the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the quantity or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn cart_update(
        &self,
        product_id: &ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<ServerCart, ApiError> {
        let body = CartLineRequest {
            product_id,
            quantity,
            size,
        };
        let payload: CartPayload = self
            .put("/cart/update", &body, Credential::Customer)
            .await?;
        Ok(payload.into())
    }

    /// Remove a line from the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn cart_remove(&self, product_id: &ProductId, size: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .delete_with_query(
                &format!("/cart/remove/{product_id}"),
                &SizeQuery { size },
                Credential::Customer,
            )
            .await?;
        Ok(())
    }

    /// Empty the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn cart_clear(&self) -> Result<(), ApiError> {
        let _: IgnoredAny = self.delete("/cart/clear", Credential::Customer).await?;
        Ok(())
    }
}
