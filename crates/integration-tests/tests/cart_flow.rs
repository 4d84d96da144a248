//! Cart behavior against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::Method;
use serde_json::{Value, json};
use shopfront_client::api::Product;
use shopfront_client::cart::Reconciliation;
use shopfront_client::storage::keys;
use shopfront_core::ProductId;
use shopfront_integration_tests::{MockBackend, product_json, user_json};

fn tee() -> Product {
    serde_json::from_value(product_json("p1", "Mango Tee", 499, 10)).unwrap()
}

#[tokio::test]
async fn test_guest_add_is_local_only() {
    let backend = MockBackend::start().await;
    let (storefront, local, toasts) = backend.storefront();
    let cart = storefront.cart();

    cart.add_item(&tee(), "M").await.unwrap();
    cart.add_item(&tee(), "M").await.unwrap();

    assert!(backend.requests().is_empty());
    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(cart.total_items(), 2);
    assert!(toasts.contains("Added to cart"));

    let stored: Value = serde_json::from_str(&local.get(keys::CART).unwrap()).unwrap();
    assert_eq!(stored["state"]["items"][0]["quantity"], 2);
    assert_eq!(stored["state"]["items"][0]["selectedSize"], "M");
    assert_eq!(stored["version"], 0);
}

#[tokio::test]
async fn test_sizes_are_separate_lines() {
    let backend = MockBackend::start().await;
    let (storefront, _local, _toasts) = backend.storefront();
    let cart = storefront.cart();

    cart.add_item(&tee(), "M").await.unwrap();
    cart.add_item(&tee(), "L").await.unwrap();

    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.total_items(), 2);
}

#[tokio::test]
async fn test_out_of_stock_rejection_leaves_cart_untouched() {
    let backend = MockBackend::start().await;
    backend.respond(Method::POST, "/api/cart/add", 400, json!({"message": "Out of stock"}));
    let (storefront, local, toasts) = backend.storefront();
    local.set(keys::TOKEN, "customer-token").unwrap();

    let err = storefront.cart().add_item(&tee(), "M").await.unwrap_err();

    assert_eq!(err.source.status(), Some(400));
    assert_eq!(err.reconciliation, Reconciliation::Unchanged);
    assert!(storefront.cart().is_empty());
    assert_eq!(toasts.errors(), vec!["Out of stock".to_string()]);

    let calls = backend.requests_to(&Method::POST, "/api/cart/add");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer customer-token"));
    assert!(calls[0].request_id.is_some());
    assert_eq!(calls[0].json(), json!({"productId": "p1", "quantity": 1, "size": "M"}));
}

#[tokio::test]
async fn test_failed_update_replaces_cart_with_server_state() {
    let backend = MockBackend::start().await;
    backend.respond(Method::POST, "/api/cart/add", 200, json!({"cart": null}));
    backend.respond(
        Method::PUT,
        "/api/cart/update",
        400,
        json!({"message": "Only 3 left in stock"}),
    );
    backend.respond(
        Method::GET,
        "/api/cart",
        200,
        json!({"items": [
            {"product": product_json("p1", "Mango Tee", 499, 3), "size": "M", "quantity": 3},
            {"product": null, "size": "S", "quantity": 1}
        ]}),
    );
    let (storefront, local, toasts) = backend.storefront();
    local.set(keys::TOKEN, "customer-token").unwrap();
    let cart = storefront.cart();
    cart.add_item(&tee(), "M").await.unwrap();

    let err = cart
        .update_quantity(&ProductId::new("p1"), "M", 5)
        .await
        .unwrap_err();

    assert_eq!(err.reconciliation, Reconciliation::Refetched);
    assert!(toasts.errors().contains(&"Only 3 left in stock".to_string()));
    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);
    assert_eq!(items[0].stock, 3);
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let backend = MockBackend::start().await;
    backend.respond(Method::POST, "/api/cart/add", 200, json!({"cart": null}));
    backend.respond(
        Method::DELETE,
        "/api/cart/remove/p1",
        200,
        json!({"message": "Item removed"}),
    );
    let (storefront, local, _toasts) = backend.storefront();
    local.set(keys::TOKEN, "customer-token").unwrap();
    let cart = storefront.cart();
    cart.add_item(&tee(), "M").await.unwrap();

    cart.update_quantity(&ProductId::new("p1"), "M", 0)
        .await
        .unwrap();

    assert!(cart.is_empty());
    assert!(backend.requests_to(&Method::PUT, "/api/cart/update").is_empty());
    let removals = backend.requests_to(&Method::DELETE, "/api/cart/remove/p1");
    assert_eq!(removals.len(), 1);
    assert_eq!(removals[0].query.as_deref(), Some("size=M"));
}

#[tokio::test]
async fn test_sync_replays_local_lines() {
    let backend = MockBackend::start().await;
    backend.respond(Method::DELETE, "/api/cart/clear", 200, json!({}));
    backend.respond(Method::POST, "/api/cart/add", 200, json!({"cart": null}));
    let (storefront, local, _toasts) = backend.storefront();
    let cart = storefront.cart();
    cart.add_item(&tee(), "M").await.unwrap();
    cart.add_item(&tee(), "M").await.unwrap();
    cart.add_item(&tee(), "L").await.unwrap();
    assert!(backend.requests().is_empty());

    local.set(keys::TOKEN, "customer-token").unwrap();
    cart.sync_with_backend().await.unwrap();

    let paths: Vec<_> = backend
        .requests()
        .iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect();
    assert_eq!(
        paths,
        ["DELETE /api/cart/clear", "POST /api/cart/add", "POST /api/cart/add"]
    );
    let adds = backend.requests_to(&Method::POST, "/api/cart/add");
    assert_eq!(adds[0].json()["quantity"], 2);
    assert_eq!(adds[1].json()["size"], "L");
}

#[tokio::test]
async fn test_rejected_token_is_cleared() {
    let backend = MockBackend::start().await;
    backend.respond(Method::GET, "/api/cart", 401, json!({"message": "Token expired"}));
    let (storefront, local, _toasts) = backend.storefront();
    local.set(keys::TOKEN, "stale-token").unwrap();
    local
        .set(keys::USER, &user_json("u1", "asha@example.com").to_string())
        .unwrap();
    assert!(storefront.auth().is_authenticated());

    let err = storefront.cart().refresh().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(local.get(keys::TOKEN).is_none());
    assert!(local.get(keys::USER).is_none());
    assert!(!storefront.auth().is_authenticated());
}
