//! Order management endpoints.

use shopfront_client::api::{ApiError, Credential, MessageResponse, Order, OrderPayload, OrdersPayload};
use shopfront_core::{OrderId, OrderStatus, PaymentStatus};
use tracing::instrument;

use super::{AdminApi, OrderStatusUpdate, PendingCount};

impl AdminApi {
    /// All orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        let payload: OrdersPayload = self.client.get("/admin/orders", Credential::Admin).await?;
        Ok(payload.into())
    }

    /// Number of orders still pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn pending_order_count(&self) -> Result<u64, ApiError> {
        let payload: PendingCount = self
            .client
            .get("/admin/orders/pending-count", Credential::Admin)
            .await?;
        Ok(payload.count)
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the request fails.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Order, ApiError> {
        let payload: OrderPayload = self
            .client
            .put(
                &format!("/admin/orders/{id}"),
                &OrderStatusUpdate {
                    status,
                    payment_status,
                },
                Credential::Admin,
            )
            .await?;
        Ok(payload.into())
    }

    /// Delete an order. Returns the backend's confirmation message, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: &OrderId) -> Result<Option<String>, ApiError> {
        let response: Option<MessageResponse> = self
            .client
            .delete(&format!("/admin/orders/{id}"), Credential::Admin)
            .await?;
        Ok(response.and_then(|r| r.message))
    }
}
