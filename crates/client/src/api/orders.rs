//! Customer order and payment endpoints.

use shopfront_core::{OrderId, Price};
use tracing::instrument;

use super::{
    ApiClient, ApiError, CreateOrderRequest, Credential, Order, OrderPayload, OrdersPayload,
    PaymentVerification, RazorpayOrder, RazorpayOrderRequest, RazorpayPayment,
};

impl ApiClient {
    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order or the request fails.
    #[instrument(skip(self, request), fields(items = request.items.len(), method = ?request.payment_method))]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        let payload: OrderPayload = self.post("/orders", request, Credential::Customer).await?;
        Ok(payload.into())
    }

    /// List the signed-in customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        let payload: OrdersPayload = self.get("/orders", Credential::Customer).await?;
        Ok(payload.into())
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let payload: OrderPayload = self
            .get(&format!("/orders/{id}"), Credential::Customer)
            .await?;
        Ok(payload.into())
    }

    /// Cancel an order that has not shipped yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the order can no longer be cancelled or the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let payload: OrderPayload = self
            .put_empty(&format!("/orders/{id}/cancel"), Credential::Customer)
            .await?;
        Ok(payload.into())
    }

    /// Create a gateway order for an online payment of `amount`.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not representable or the request fails.
    #[instrument(skip(self), fields(amount = %amount))]
    pub async fn create_razorpay_order(
        &self,
        amount: Price,
        currency: &str,
    ) -> Result<RazorpayOrder, ApiError> {
        let paise = amount
            .to_minor()
            .ok_or_else(|| ApiError::InvalidRequest(format!("Amount {amount} is out of range")))?;
        let body = RazorpayOrderRequest {
            amount: paise,
            currency: currency.to_string(),
        };
        self.post("/orders/razorpay/create", &body, Credential::Customer)
            .await
    }

    /// Ask the backend to verify a gateway payment signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, payment), fields(gateway_order = %payment.razorpay_order_id))]
    pub async fn verify_payment(
        &self,
        payment: &RazorpayPayment,
    ) -> Result<PaymentVerification, ApiError> {
        self.post("/orders/razorpay/verify", payment, Credential::Customer)
            .await
    }
}
