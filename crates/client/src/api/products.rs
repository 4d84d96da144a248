//! Product catalog endpoints.

use shopfront_core::ProductId;
use tracing::instrument;

use super::{ApiClient, ApiError, Credential, PageQuery, Product, ProductPayload, ProductsPayload};

impl ApiClient {
    /// List products, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, page: u32, limit: u32) -> Result<Vec<Product>, ApiError> {
        let payload: ProductsPayload = self
            .get_with_query("/products", &PageQuery { page, limit }, Credential::Anonymous)
            .await?;
        Ok(payload.into())
    }

    /// List the products of one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        let payload: ProductsPayload = self
            .get(
                &format!("/products/category/{category}"),
                Credential::Anonymous,
            )
            .await?;
        Ok(payload.into())
    }

    /// List featured products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        let payload: ProductsPayload = self
            .get("/products/featured", Credential::Anonymous)
            .await?;
        Ok(payload.into())
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let payload: ProductPayload = self
            .get(&format!("/products/{id}"), Credential::Anonymous)
            .await?;
        Ok(payload.into())
    }
}
