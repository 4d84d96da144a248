//! Wishlist endpoints. Every call answers with the full id list.

use shopfront_core::ProductId;
use tracing::instrument;

use super::{ApiClient, ApiError, Credential, WishlistEntry, WishlistRequest, WishlistResponse};

fn ids(response: WishlistResponse) -> Vec<ProductId> {
    response
        .wishlist
        .iter()
        .map(WishlistEntry::product_id)
        .cloned()
        .collect()
}

impl ApiClient {
    /// Fetch the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn wishlist(&self) -> Result<Vec<ProductId>, ApiError> {
        let response: WishlistResponse = self.get("/wishlist", Credential::Customer).await?;
        Ok(ids(response))
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn wishlist_add(&self, product_id: &ProductId) -> Result<Vec<ProductId>, ApiError> {
        let response: WishlistResponse = self
            .post(
                "/wishlist/add",
                &WishlistRequest { product_id },
                Credential::Customer,
            )
            .await?;
        Ok(ids(response))
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn wishlist_remove(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<ProductId>, ApiError> {
        let response: WishlistResponse = self
            .delete(
                &format!("/wishlist/remove/{product_id}"),
                Credential::Customer,
            )
            .await?;
        Ok(ids(response))
    }
}
