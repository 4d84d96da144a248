//! Subcommand implementations.

pub mod account;
pub mod admin;
pub mod shop;

use std::io::Write;

use secrecy::SecretString;
use serde::Serialize;
use shopfront_admin::AdminError;
use shopfront_client::ClientError;
use shopfront_client::api::ApiError;
use shopfront_client::auth::AuthError;
use shopfront_client::cart::CartError;
use shopfront_client::checkout::CheckoutError;
use shopfront_client::reviews::ReviewError;
use shopfront_client::storage::StorageError;
use shopfront_client::wishlist::WishlistError;
use thiserror::Error;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("Missing password: pass --password or set {0}")]
    MissingPassword(&'static str),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Json(#[from] serde_json::Error),
}

macro_rules! via_client_error {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for CliError {
                fn from(e: $source) -> Self {
                    Self::Client(ClientError::from(e))
                }
            }
        )+
    };
}

via_client_error!(
    ApiError,
    AuthError,
    CartError,
    CheckoutError,
    ReviewError,
    StorageError,
    WishlistError,
);

/// Write a value to stdout as pretty JSON.
pub fn emit<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Wrap a password taken from a flag or its environment fallback.
pub fn password(value: Option<String>, env_var: &'static str) -> Result<SecretString, CliError> {
    value
        .filter(|p| !p.is_empty())
        .map(SecretString::from)
        .ok_or(CliError::MissingPassword(env_var))
}

/// Wait for Ctrl+C.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
