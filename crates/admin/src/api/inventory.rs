//! Inventory endpoints.

use shopfront_client::api::{ApiError, Credential};
use shopfront_core::ProductId;
use tracing::instrument;

use super::{
    AdminApi, BulkStockLine, BulkStockUpdate, DaysQuery, InventoryItem, InventoryPayload,
    InventoryStats, MovementsPayload, StockMovement, StockUpdate, ThresholdQuery,
};

impl AdminApi {
    /// Stock position of every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn inventory_overview(&self) -> Result<Vec<InventoryItem>, ApiError> {
        let payload: InventoryPayload = self
            .client
            .get("/admin/inventory/overview", Credential::Admin)
            .await?;
        Ok(payload.into())
    }

    /// Aggregate inventory figures.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn inventory_stats(&self) -> Result<InventoryStats, ApiError> {
        self.client
            .get("/admin/inventory/stats", Credential::Admin)
            .await
    }

    /// Set a product's stock.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_stock(
        &self,
        product_id: &ProductId,
        stock: u32,
        reason: Option<&str>,
    ) -> Result<InventoryItem, ApiError> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Payload {
            Wrapped { product: InventoryItem },
            Bare(InventoryItem),
        }

        let payload: Payload = self
            .client
            .put(
                &format!("/admin/inventory/{product_id}/stock"),
                &StockUpdate { stock, reason },
                Credential::Admin,
            )
            .await?;
        Ok(match payload {
            Payload::Wrapped { product } | Payload::Bare(product) => product,
        })
    }

    /// Set the stock of several products at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, updates), fields(lines = updates.len()))]
    pub async fn bulk_update_stock(&self, updates: &[BulkStockLine]) -> Result<(), ApiError> {
        let _: serde::de::IgnoredAny = self
            .client
            .post(
                "/admin/inventory/bulk-update",
                &BulkStockUpdate { updates },
                Credential::Admin,
            )
            .await?;
        Ok(())
    }

    /// Products at or below `threshold` units.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: u32) -> Result<Vec<InventoryItem>, ApiError> {
        let payload: InventoryPayload = self
            .client
            .get_with_query(
                "/admin/inventory/low-stock",
                &ThresholdQuery { threshold },
                Credential::Admin,
            )
            .await?;
        Ok(payload.into())
    }

    /// Products with no stock.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn out_of_stock(&self) -> Result<Vec<InventoryItem>, ApiError> {
        let payload: InventoryPayload = self
            .client
            .get("/admin/inventory/out-of-stock", Credential::Admin)
            .await?;
        Ok(payload.into())
    }

    /// Stock changes over the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn stock_movements(&self, days: u32) -> Result<Vec<StockMovement>, ApiError> {
        let payload: MovementsPayload = self
            .client
            .get_with_query(
                "/admin/inventory/movements",
                &DaysQuery { days },
                Credential::Admin,
            )
            .await?;
        Ok(payload.into())
    }
}
