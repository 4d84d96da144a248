//! Checkout and order history.
//!
//! Placing an order always pushes the local cart to the server first
//! ([`CartStore::sync_with_backend`]) so the backend validates stock against
//! exactly what the customer sees, and clears the cart once the order exists.
//!
//! Two payment paths:
//! - cash on delivery: [`Checkout::place_cod_order`]
//! - Razorpay: [`Checkout::start_online_payment`] creates the gateway order,
//!   the front end runs the gateway widget, then
//!   [`Checkout::complete_online_payment`] verifies the signature and places
//!   the order

use std::sync::Arc;

use shopfront_core::{CurrencyCode, OrderId, PaymentMethod, Price};
use thiserror::Error;
use tracing::{info, instrument};

use crate::api::{
    ApiClient, ApiError, CreateOrderRequest, Credential, Order, OrderLine, RazorpayOrder,
    RazorpayPayment, ShippingAddress,
};
use crate::cart::{CartError, CartItem, CartStore};
use crate::error::add_breadcrumb;
use crate::notify::{SharedNotifier, Toast};

/// Errors from checkout and order operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Orders need a customer session.
    #[error("Please login to place an order")]
    NotAuthenticated,

    /// Nothing to order.
    #[error("Your cart is empty")]
    EmptyCart,

    /// A shipping address field failed validation.
    #[error("{0}")]
    InvalidAddress(String),

    /// The cart could not be pushed to the server.
    #[error("Cart sync failed: {0}")]
    Cart(#[from] CartError),

    /// The backend did not confirm the payment signature.
    #[error("Payment verification failed: {0}")]
    PaymentNotVerified(String),

    /// The order cannot be cancelled in its current state.
    #[error("Order cannot be cancelled once {0}")]
    NotCancellable(shopfront_core::OrderStatus),

    /// The backend rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Check a shipping address.
///
/// # Errors
///
/// Returns [`CheckoutError::InvalidAddress`] naming the first bad field.
pub fn validate_address(address: &ShippingAddress) -> Result<(), CheckoutError> {
    let required = [
        ("Full name", &address.full_name),
        ("Phone", &address.phone),
        ("Address", &address.address_line),
        ("City", &address.city),
        ("State", &address.state),
        ("Pincode", &address.pincode),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(CheckoutError::InvalidAddress(format!("{field} is required")));
    }

    let phone: String = address
        .phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let phone = phone.strip_prefix("+91").unwrap_or(&phone);
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(CheckoutError::InvalidAddress(
            "Please enter a valid 10-digit phone number".to_string(),
        ));
    }

    let pincode = address.pincode.trim();
    if pincode.len() != 6 || !pincode.chars().all(|c| c.is_ascii_digit()) {
        return Err(CheckoutError::InvalidAddress(
            "Please enter a valid 6-digit pincode".to_string(),
        ));
    }
    Ok(())
}

/// Snapshot cart lines as order lines.
#[must_use]
pub fn order_lines(items: &[CartItem]) -> Vec<OrderLine> {
    items
        .iter()
        .map(|item| OrderLine {
            product: item.product_id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            size: item.size.clone(),
            image: item.image.clone(),
        })
        .collect()
}

/// Checkout flow over the session's cart.
#[derive(Clone)]
pub struct Checkout {
    api: ApiClient,
    cart: Arc<CartStore<ApiClient>>,
    notifier: SharedNotifier,
    currency: CurrencyCode,
}

impl Checkout {
    /// Create the checkout for a cart.
    #[must_use]
    pub fn new(
        api: ApiClient,
        cart: Arc<CartStore<ApiClient>>,
        notifier: SharedNotifier,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            api,
            cart,
            notifier,
            currency,
        }
    }

    /// Place a cash-on-delivery order for the whole cart.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session, the cart is empty, the
    /// address is invalid, the cart sync fails or the backend rejects the
    /// order. The cart is kept in every failure case.
    #[instrument(skip(self, address))]
    pub async fn place_cod_order(&self, address: &ShippingAddress) -> Result<Order, CheckoutError> {
        let total = self.prepare(address).await?;
        let request = CreateOrderRequest {
            items: order_lines(&self.cart.items()),
            shipping_address: address.clone(),
            payment_method: PaymentMethod::Cod,
            total_amount: total,
            payment: None,
        };
        self.place(&request).await
    }

    /// Validate, sync the cart and create the gateway order for its total.
    ///
    /// # Errors
    ///
    /// See [`Checkout::place_cod_order`].
    #[instrument(skip(self, address))]
    pub async fn start_online_payment(
        &self,
        address: &ShippingAddress,
    ) -> Result<RazorpayOrder, CheckoutError> {
        let total = self.prepare(address).await?;
        let gateway = self
            .api
            .create_razorpay_order(total, self.currency.code())
            .await
            .map_err(|e| self.fail(e.into()))?;
        info!(gateway_order = %gateway.id, amount = gateway.amount, "Created gateway order");
        Ok(gateway)
    }

    /// Verify a completed gateway payment and place the order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::PaymentNotVerified`] if the backend does not
    /// confirm the signature; no order is created then.
    #[instrument(skip(self, address, payment), fields(gateway_order = %payment.razorpay_order_id))]
    pub async fn complete_online_payment(
        &self,
        address: &ShippingAddress,
        payment: RazorpayPayment,
    ) -> Result<Order, CheckoutError> {
        let verification = self
            .api
            .verify_payment(&payment)
            .await
            .map_err(|e| self.fail(e.into()))?;
        if !verification.verified {
            let reason = verification
                .message
                .unwrap_or_else(|| "signature mismatch".to_string());
            return Err(self.fail(CheckoutError::PaymentNotVerified(reason)));
        }

        let items = self.cart.items();
        let request = CreateOrderRequest {
            total_amount: items.iter().map(CartItem::line_total).sum(),
            items: order_lines(&items),
            shipping_address: address.clone(),
            payment_method: PaymentMethod::Razorpay,
            payment: Some(payment),
        };
        self.place(&request).await
    }

    /// The customer's orders, newest first as returned by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the request fails.
    pub async fn orders(&self) -> Result<Vec<Order>, CheckoutError> {
        self.require_session()?;
        Ok(self.api.my_orders().await?)
    }

    /// One of the customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the request fails.
    pub async fn order(&self, id: &OrderId) -> Result<Order, CheckoutError> {
        self.require_session()?;
        Ok(self.api.order(id).await?)
    }

    /// Cancel an order that has not shipped yet.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotCancellable`] without calling the cancel
    /// endpoint if the order is already past processing.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Order, CheckoutError> {
        self.require_session()?;
        let order = self.api.order(id).await?;
        if !order.status.is_cancellable() {
            return Err(self.fail(CheckoutError::NotCancellable(order.status)));
        }
        let order = self
            .api
            .cancel_order(id)
            .await
            .map_err(|e| self.fail(e.into()))?;
        self.notifier.notify(Toast::success("Order cancelled"));
        Ok(order)
    }

    /// Common preconditions; returns the cart total.
    async fn prepare(&self, address: &ShippingAddress) -> Result<Price, CheckoutError> {
        self.require_session()?;
        if self.cart.is_empty() {
            return Err(self.fail(CheckoutError::EmptyCart));
        }
        validate_address(address).map_err(|e| self.fail(e))?;
        // The sync reports its own failure toast.
        self.cart.sync_with_backend().await?;
        Ok(self.cart.total_price())
    }

    async fn place(&self, request: &CreateOrderRequest) -> Result<Order, CheckoutError> {
        let order = self
            .api
            .create_order(request)
            .await
            .map_err(|e| self.fail(e.into()))?;

        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
        info!(order_id = %order.id, total = %order.total_amount, "Order placed");
        self.notifier.notify(Toast::success("Order placed successfully"));

        self.cart.clear_cart().await;
        Ok(order)
    }

    fn require_session(&self) -> Result<(), CheckoutError> {
        if self.api.has_token(Credential::Customer) {
            Ok(())
        } else {
            Err(self.fail(CheckoutError::NotAuthenticated))
        }
    }

    fn fail(&self, error: CheckoutError) -> CheckoutError {
        let message = match &error {
            CheckoutError::Api(e) => e.user_message(),
            other => other.to_string(),
        };
        self.notifier.notify(Toast::error(message));
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Asha Rao".to_string(),
            phone: "+91 98765-43210".to_string(),
            address_line: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            country: "India".to_string(),
        }
    }

    #[test]
    fn test_valid_address() {
        assert!(validate_address(&address()).is_ok());
    }

    #[test]
    fn test_address_missing_field() {
        let mut addr = address();
        addr.city = "  ".to_string();
        let err = validate_address(&addr).unwrap_err();
        assert_eq!(err.to_string(), "City is required");
    }

    #[test]
    fn test_address_bad_phone_and_pincode() {
        let mut addr = address();
        addr.phone = "12345".to_string();
        assert!(validate_address(&addr).unwrap_err().to_string().contains("phone"));

        let mut addr = address();
        addr.pincode = "56000A".to_string();
        assert!(validate_address(&addr).unwrap_err().to_string().contains("pincode"));
    }

    #[test]
    fn test_order_lines_snapshot_cart() {
        let product: crate::api::Product = serde_json::from_value(serde_json::json!({
            "_id": "p1", "name": "Tee", "price": 499.5, "image": "tee.jpg", "stock": 3
        }))
        .unwrap();
        let mut item = CartItem::from_product(&product, "L");
        item.quantity = 2;

        let lines = order_lines(&[item]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].size, "L");
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].price, Price::from_minor(49_950));
    }
}
