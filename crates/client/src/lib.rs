//! Shopfront storefront client.
//!
//! A REST client for the storefront backend plus the session-side state a
//! shop front end keeps: customer auth, a server-validated cart, wishlist,
//! cached catalog with debounced search, the promotional offer
//! interstitial, product reviews and checkout. [`state::Storefront`] wires
//! them together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod notify;
pub mod offers;
pub mod reviews;
pub mod state;
pub mod storage;
pub mod timer;
pub mod wishlist;

pub use api::{ApiClient, ApiError, Credential};
pub use config::ClientConfig;
pub use error::ClientError;
pub use state::Storefront;
