//! Shopfront back office.
//!
//! Admin endpoints (inventory, offers, orders, payment QR code) over the
//! storefront REST client, plus the admin session and its pending-order
//! badge poller.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod poller;
pub mod session;

pub use api::{AdminApi, QrUpload};
pub use poller::{PendingOrderPoller, PendingOrderSource, PendingOrders};
pub use session::{AdminError, AdminSession};
