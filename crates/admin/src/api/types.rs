//! Back-office wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfront_core::{Email, OrderStatus, PaymentStatus, Price, ProductId, StockStatus, UserId};

// =============================================================================
// Auth
// =============================================================================

/// The signed-in administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: Email,
}

/// Response of `POST /admin/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub admin: AdminProfile,
}

/// Body of `POST /admin/login`.
#[derive(Debug, Clone, Serialize)]
pub struct AdminLoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

// =============================================================================
// Orders
// =============================================================================

/// Response of `GET /admin/orders/pending-count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PendingCount {
    pub count: u64,
}

/// Body of `PUT /admin/orders/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

// =============================================================================
// Inventory
// =============================================================================

/// Stock position of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(rename = "_id")]
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    pub price: Price,
    pub stock: u32,
}

impl InventoryItem {
    /// Classify the stock against a low-stock threshold.
    #[must_use]
    pub const fn status(&self, low_threshold: u32) -> StockStatus {
        StockStatus::classify(self.stock, low_threshold)
    }

    /// Stock value at the unit price.
    #[must_use]
    pub fn stock_value(&self) -> Price {
        self.price.times(self.stock)
    }
}

/// Inventory list payload: `{ "products": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InventoryPayload {
    Wrapped {
        #[serde(alias = "items")]
        products: Vec<InventoryItem>,
    },
    Bare(Vec<InventoryItem>),
}

impl From<InventoryPayload> for Vec<InventoryItem> {
    fn from(payload: InventoryPayload) -> Self {
        match payload {
            InventoryPayload::Wrapped { products } | InventoryPayload::Bare(products) => products,
        }
    }
}

/// Aggregate inventory figures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    #[serde(default)]
    pub total_products: u32,
    #[serde(default)]
    pub total_stock: u64,
    #[serde(default)]
    pub low_stock_count: u32,
    #[serde(default)]
    pub out_of_stock_count: u32,
    #[serde(default)]
    pub total_value: Price,
}

/// Body of `PUT /admin/inventory/{id}/stock`.
#[derive(Debug, Clone, Serialize)]
pub struct StockUpdate<'a> {
    pub stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

/// One line of a bulk stock update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStockLine {
    pub product_id: ProductId,
    pub stock: u32,
}

/// Body of `POST /admin/inventory/bulk-update`.
#[derive(Debug, Clone, Serialize)]
pub struct BulkStockUpdate<'a> {
    pub updates: &'a [BulkStockLine],
}

/// Query of `GET /admin/inventory/low-stock`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThresholdQuery {
    pub threshold: u32,
}

/// Query of `GET /admin/inventory/movements`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DaysQuery {
    pub days: u32,
}

/// A recorded stock change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: String,
    /// Signed change in units; sales are negative.
    pub change: i64,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Movement report payload: `{ "movements": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MovementsPayload {
    Wrapped { movements: Vec<StockMovement> },
    Bare(Vec<StockMovement>),
}

impl From<MovementsPayload> for Vec<StockMovement> {
    fn from(payload: MovementsPayload) -> Self {
        match payload {
            MovementsPayload::Wrapped { movements } | MovementsPayload::Bare(movements) => {
                movements
            }
        }
    }
}

// =============================================================================
// Offers
// =============================================================================

/// Body of `POST /admin/offers` and `PUT /admin/offers/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDraft {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_payload_shapes() {
        let wrapped: InventoryPayload = serde_json::from_str(
            r#"{"items":[{"_id":"p1","name":"Tee","price":499,"stock":3}]}"#,
        )
        .unwrap();
        let items = Vec::<InventoryItem>::from(wrapped);
        assert_eq!(items[0].status(5), StockStatus::LowStock);
        assert_eq!(items[0].stock_value(), Price::from_minor(149_700));
    }

    #[test]
    fn test_offer_draft_serialization() {
        let draft = OfferDraft {
            title: "Monsoon Sale".to_string(),
            description: "Flat 20% off".to_string(),
            discount_percentage: Some(20),
            is_active: true,
            ..OfferDraft::default()
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["discountPercentage"], 20);
        assert_eq!(value["isActive"], true);
        assert!(value.get("code").is_none());
    }

    #[test]
    fn test_status_update_serialization() {
        let update = OrderStatusUpdate {
            status: OrderStatus::Shipped,
            payment_status: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"status": "shipped"})
        );
    }
}
