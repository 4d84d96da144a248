//! Unified error handling with Sentry integration.
//!
//! Each store has its own error enum; [`ClientError`] wraps them for callers
//! (such as the CLI) that drive several stores and want one `Result` type.

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::reviews::ReviewError;
use crate::storage::StorageError;
use crate::wishlist::WishlistError;

/// Top-level error for storefront client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// A cart mutation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// A wishlist operation failed.
    #[error("Wishlist error: {0}")]
    Wishlist(#[from] WishlistError),

    /// A review operation failed.
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),
}

impl ClientError {
    /// Whether the failure is worth reporting to Sentry.
    ///
    /// Business-rule rejections and validation errors are expected; transport
    /// failures, undecodable responses, 5xx answers and local I/O are not.
    #[must_use]
    pub fn is_reportable(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) => true,
            Self::Api(e) => api_reportable(e),
            Self::Auth(AuthError::Api(e))
            | Self::Cart(CartError { source: e, .. })
            | Self::Wishlist(WishlistError::Api(e))
            | Self::Review(ReviewError::Api(e))
            | Self::Checkout(CheckoutError::Api(e)) => api_reportable(e),
            Self::Auth(AuthError::Storage(_)) => true,
            Self::Auth(_) | Self::Wishlist(_) | Self::Review(_) | Self::Checkout(_) => false,
        }
    }
}

fn api_reportable(error: &ApiError) -> bool {
    match error {
        ApiError::Status { status, .. } => *status >= 500,
        ApiError::Transport(_) | ApiError::Decode(_) | ApiError::InvalidRequest(_) => true,
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Log a surfaced failure and capture it to Sentry when reportable.
pub fn report(error: &ClientError) {
    if error.is_reportable() {
        let event_id = sentry::capture_error(error);
        tracing::error!(error = %error, sentry_event_id = %event_id, "Operation failed");
    } else {
        tracing::warn!(error = %error, "Operation rejected");
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "p1"), ("size", "M")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
