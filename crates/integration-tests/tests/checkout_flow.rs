//! Cash-on-delivery checkout against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::Method;
use serde_json::json;
use shopfront_client::api::{Product, ShippingAddress};
use shopfront_client::checkout::CheckoutError;
use shopfront_client::storage::keys;
use shopfront_core::{OrderId, OrderStatus, PaymentMethod};
use shopfront_integration_tests::{MockBackend, product_json};

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".to_string(),
        phone: "9876543210".to_string(),
        address_line: "12 MG Road".to_string(),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        pincode: "560001".to_string(),
        country: "India".to_string(),
    }
}

#[tokio::test]
async fn test_cod_order_syncs_places_and_clears() {
    let backend = MockBackend::start().await;
    backend.respond(Method::DELETE, "/api/cart/clear", 200, json!({}));
    backend.respond(Method::POST, "/api/cart/add", 200, json!({"cart": null}));
    backend.respond(
        Method::POST,
        "/api/orders",
        201,
        json!({"order": {
            "_id": "o1",
            "items": [],
            "paymentMethod": "cod",
            "paymentStatus": "pending",
            "status": "pending",
            "totalAmount": 998
        }}),
    );
    let (storefront, local, toasts) = backend.storefront();
    let tee: Product = serde_json::from_value(product_json("p1", "Mango Tee", 499, 10)).unwrap();
    storefront.cart().add_item(&tee, "M").await.unwrap();
    storefront.cart().add_item(&tee, "M").await.unwrap();
    local.set(keys::TOKEN, "customer-token").unwrap();

    let order = storefront.checkout().place_cod_order(&address()).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::Cod);
    assert!(storefront.cart().is_empty());
    assert!(toasts.contains("Order placed successfully"));

    let paths: Vec<_> = backend
        .requests()
        .iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect();
    assert_eq!(
        paths,
        [
            "DELETE /api/cart/clear",
            "POST /api/cart/add",
            "POST /api/orders",
            "DELETE /api/cart/clear",
        ]
    );

    let placed = backend.requests_to(&Method::POST, "/api/orders");
    let body = placed[0].json();
    assert_eq!(body["paymentMethod"], "cod");
    assert_eq!(body["items"][0]["product"], "p1");
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["shippingAddress"]["pincode"], "560001");
}

#[tokio::test]
async fn test_empty_cart_makes_no_request() {
    let backend = MockBackend::start().await;
    let (storefront, local, toasts) = backend.storefront();
    local.set(keys::TOKEN, "customer-token").unwrap();

    let err = storefront
        .checkout()
        .place_cod_order(&address())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert!(backend.requests().is_empty());
    assert_eq!(toasts.errors().len(), 1);
}

#[tokio::test]
async fn test_invalid_pincode_makes_no_request() {
    let backend = MockBackend::start().await;
    let (storefront, local, _toasts) = backend.storefront();
    let tee: Product = serde_json::from_value(product_json("p1", "Mango Tee", 499, 10)).unwrap();
    storefront.cart().add_item(&tee, "M").await.unwrap();
    local.set(keys::TOKEN, "customer-token").unwrap();

    let mut address = address();
    address.pincode = "5600".to_string();
    let err = storefront
        .checkout()
        .place_cod_order(&address)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InvalidAddress(_)));
    assert!(backend.requests().is_empty());
    assert_eq!(storefront.cart().total_items(), 1);
}

#[tokio::test]
async fn test_cancel_sends_no_body() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/orders/o1",
        200,
        json!({"order": {"_id": "o1", "paymentMethod": "cod", "status": "pending", "totalAmount": 499}}),
    );
    backend.respond(
        Method::PUT,
        "/api/orders/o1/cancel",
        200,
        json!({"order": {"_id": "o1", "paymentMethod": "cod", "status": "cancelled", "totalAmount": 499}}),
    );
    let (storefront, local, toasts) = backend.storefront();
    local.set(keys::TOKEN, "customer-token").unwrap();

    let order = storefront
        .checkout()
        .cancel_order(&OrderId::new("o1"))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(toasts.contains("Order cancelled"));
    let cancel = &backend.requests_to(&Method::PUT, "/api/orders/o1/cancel")[0];
    assert!(cancel.body.is_empty());
    assert_eq!(cancel.authorization.as_deref(), Some("Bearer customer-token"));
}
