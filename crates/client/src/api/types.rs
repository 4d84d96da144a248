//! Wire types for the storefront REST API.
//!
//! The backend speaks camelCase JSON and names document ids `_id`. Some list
//! endpoints return a bare array and others wrap it in an object, so list
//! payloads are decoded through small untagged enums and flattened.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfront_core::{
    Email, OfferId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId, Rating,
    ReviewId, UserId,
};

// =============================================================================
// Users & Auth
// =============================================================================

/// Minimal user profile returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Response of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Registration request body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Profile update request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub num_reviews: u32,
}

impl Product {
    /// Primary image: the `image` field, else the first gallery image.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        if self.image.is_empty() {
            self.images.first().map_or("", String::as_str)
        } else {
            &self.image
        }
    }

    /// Whether the product can currently be ordered at all.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Product list payload: `{ "products": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductsPayload {
    Wrapped { products: Vec<Product> },
    Bare(Vec<Product>),
}

impl From<ProductsPayload> for Vec<Product> {
    fn from(payload: ProductsPayload) -> Self {
        match payload {
            ProductsPayload::Wrapped { products } | ProductsPayload::Bare(products) => products,
        }
    }
}

/// Single product payload: `{ "product": {...} }` or the bare document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductPayload {
    Wrapped { product: Product },
    Bare(Product),
}

impl From<ProductPayload> for Product {
    fn from(payload: ProductPayload) -> Self {
        match payload {
            ProductPayload::Wrapped { product } | ProductPayload::Bare(product) => product,
        }
    }
}

/// Page position returned alongside paginated lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
    #[serde(default)]
    pub total: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            pages: 1,
            total: 0,
        }
    }
}

const fn first_page() -> u32 {
    1
}

/// Query for paginated endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

// =============================================================================
// Cart
// =============================================================================

/// Body of `POST /cart/add` and `PUT /cart/update`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
    pub size: &'a str,
}

/// Query of `DELETE /cart/remove/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct SizeQuery<'a> {
    pub size: &'a str,
}

/// One line of the server-side cart.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerCartLine {
    /// The populated product; `null` when the product was deleted.
    pub product: Option<Product>,
    #[serde(default)]
    pub size: String,
    pub quantity: u32,
}

/// The server-side cart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerCart {
    pub items: Vec<ServerCartLine>,
}

/// Cart payload: the bare cart, or `{ "cart": {...} }` where `cart` may be
/// `null` for a user who never added anything.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CartPayload {
    Bare(ServerCart),
    Wrapped { cart: Option<ServerCart> },
}

impl From<CartPayload> for ServerCart {
    fn from(payload: CartPayload) -> Self {
        match payload {
            CartPayload::Wrapped { cart } => cart.unwrap_or_default(),
            CartPayload::Bare(cart) => cart,
        }
    }
}

// =============================================================================
// Wishlist
// =============================================================================

/// A wishlist entry, either a bare product id or a populated product.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WishlistEntry {
    Id(ProductId),
    Populated {
        #[serde(rename = "_id")]
        id: ProductId,
    },
}

impl WishlistEntry {
    /// The product id of the entry.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        match self {
            Self::Id(id) | Self::Populated { id } => id,
        }
    }
}

/// Wishlist payload returned by every wishlist endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WishlistResponse {
    #[serde(default)]
    pub wishlist: Vec<WishlistEntry>,
}

/// Body of `POST /wishlist/add`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRequest<'a> {
    pub product_id: &'a ProductId,
}

// =============================================================================
// Offers
// =============================================================================

/// A promotional offer shown in the interstitial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(rename = "_id")]
    pub id: OfferId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

impl Offer {
    /// Whether the offer is active and not past its end date.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_until.is_none_or(|until| until > now)
    }
}

const fn default_true() -> bool {
    true
}

/// Offer list payload: `{ "offers": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OffersPayload {
    Wrapped { offers: Vec<Offer> },
    Bare(Vec<Offer>),
}

impl From<OffersPayload> for Vec<Offer> {
    fn from(payload: OffersPayload) -> Self {
        match payload {
            OffersPayload::Wrapped { offers } | OffersPayload::Bare(offers) => offers,
        }
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// The author of a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    pub user: ReviewAuthor,
    pub rating: Rating,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregate rating statistics for a product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u32,
    /// Number of reviews per star value (keys 1-5).
    #[serde(default)]
    pub distribution: BTreeMap<u8, u32>,
}

/// One page of reviews with aggregate stats.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPage {
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub stats: ReviewStats,
}

/// Body of `POST /reviews`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest<'a> {
    pub product_id: &'a ProductId,
    pub rating: Rating,
    pub comment: &'a str,
}

/// Body of `PUT /reviews/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReviewRequest<'a> {
    pub rating: Rating,
    pub comment: &'a str,
}

// =============================================================================
// Orders & Payments
// =============================================================================

/// Delivery address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "India".to_string()
}

/// A line of a placed order (snapshot of the cart line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    pub size: String,
    #[serde(default)]
    pub image: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Order payload: `{ "order": {...} }` or the bare document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrderPayload {
    Wrapped { order: Order },
    Bare(Order),
}

impl From<OrderPayload> for Order {
    fn from(payload: OrderPayload) -> Self {
        match payload {
            OrderPayload::Wrapped { order } | OrderPayload::Bare(order) => order,
        }
    }
}

/// Order list payload: `{ "orders": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrdersPayload {
    Wrapped { orders: Vec<Order> },
    Bare(Vec<Order>),
}

impl From<OrdersPayload> for Vec<Order> {
    fn from(payload: OrdersPayload) -> Self {
        match payload {
            OrdersPayload::Wrapped { orders } | OrdersPayload::Bare(orders) => orders,
        }
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub total_amount: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<RazorpayPayment>,
}

/// Body of `POST /orders/razorpay/create`; `amount` is in paise.
#[derive(Debug, Clone, Serialize)]
pub struct RazorpayOrderRequest {
    pub amount: i64,
    pub currency: String,
}

/// Gateway order created by `POST /orders/razorpay/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// Payment proof returned by the gateway checkout, verified by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RazorpayPayment {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Response of `POST /orders/razorpay/verify`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentVerification {
    #[serde(default, alias = "success")]
    pub verified: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Misc
// =============================================================================

/// Generic acknowledgement body (`{ "message": "..." }`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Payment QR code reference (`{ "qrCode": "..." }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    /// An image URL or a `data:` URL with the encoded image.
    pub qr_code: String,
}
