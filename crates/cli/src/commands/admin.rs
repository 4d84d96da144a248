//! Back-office commands.
//!
//! # Usage
//!
//! ```bash
//! sf-cli admin login -e admin@example.com
//! sf-cli admin pending --watch
//! sf-cli admin inventory low-stock --threshold 5
//! sf-cli admin orders status 65a1 shipped
//! sf-cli admin qr upload ./upi.png
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;
use serde_json::json;
use shopfront_admin::api::{BulkStockLine, OfferDraft};
use shopfront_admin::{AdminApi, AdminSession, QrUpload};
use shopfront_client::Storefront;
use shopfront_core::{OfferId, OrderId, OrderStatus, ProductId};
use tracing::info;

use super::{CliError, emit, interrupted, password};

const PASSWORD_ENV: &str = "SHOPFRONT_ADMIN_PASSWORD";

/// How often `pending --watch` checks that the poller is still alive.
const LIVENESS_CHECK: Duration = Duration::from_secs(1);

#[derive(Subcommand)]
pub enum AdminAction {
    /// Sign in as an administrator
    Login {
        #[arg(short, long)]
        email: String,
        /// Password (falls back to `SHOPFRONT_ADMIN_PASSWORD`)
        #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out of the back office
    Logout,
    /// Pending order count
    Pending {
        /// Keep polling and log badge changes until Ctrl+C
        #[arg(long)]
        watch: bool,
    },
    /// Inventory reports and stock changes
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },
    /// Manage offers
    Offers {
        #[command(subcommand)]
        action: AdminOfferAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: AdminOrderAction,
    },
    /// Payment QR code
    Qr {
        #[command(subcommand)]
        action: QrAction,
    },
}

#[derive(Subcommand)]
pub enum InventoryAction {
    /// Stock of every product
    Overview,
    /// Aggregate figures
    Stats,
    /// Products at or below a threshold
    LowStock {
        #[arg(long, default_value_t = 10)]
        threshold: u32,
    },
    /// Products with no stock
    OutOfStock,
    /// Stock changes over recent days
    Movements {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Set one product's stock
    Set {
        product_id: String,
        stock: u32,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Set several products' stock (`id=stock` pairs)
    Bulk {
        #[arg(required = true, value_parser = parse_stock_line)]
        lines: Vec<BulkStockLine>,
    },
}

#[derive(Subcommand)]
pub enum AdminOfferAction {
    /// All offers
    List,
    /// Create an active offer
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        discount: Option<u32>,
        #[arg(long)]
        code: Option<String>,
        /// Create it inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Flip an offer on or off
    Toggle { offer_id: String },
    /// Delete an offer
    Delete { offer_id: String },
}

#[derive(Subcommand)]
pub enum AdminOrderAction {
    /// All orders
    List,
    /// Move an order to a new status
    Status {
        order_id: String,
        #[arg(value_parser = str::parse::<OrderStatus>)]
        status: OrderStatus,
    },
    /// Delete an order
    Delete { order_id: String },
}

#[derive(Subcommand)]
pub enum QrAction {
    /// Show the current QR code reference
    Show,
    /// Upload a new QR code image
    Upload { path: PathBuf },
}

fn parse_stock_line(raw: &str) -> Result<BulkStockLine, String> {
    let (id, stock) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <product-id>=<stock>, got {raw}"))?;
    let stock = stock
        .parse()
        .map_err(|e| format!("invalid stock for {id}: {e}"))?;
    Ok(BulkStockLine {
        product_id: ProductId::new(id),
        stock,
    })
}

pub async fn run(storefront: &Storefront, action: AdminAction) -> Result<(), CliError> {
    let session = AdminSession::new(
        AdminApi::new(storefront.api().clone()),
        storefront.config().admin_poll_interval,
    );
    let api = session.api();

    match action {
        AdminAction::Login { email, password: flag } => {
            let password = password(flag, PASSWORD_ENV)?;
            let profile = session.login(&email, &password).await?;
            emit(&profile)
        }
        AdminAction::Logout => {
            session.logout();
            Ok(())
        }
        AdminAction::Pending { watch: false } => {
            let count = api.pending_order_count().await?;
            emit(&json!({ "pending": count }))
        }
        AdminAction::Pending { watch: true } => watch_pending(&session).await,
        AdminAction::Inventory { action } => inventory(api, action).await,
        AdminAction::Offers { action } => offers(api, action).await,
        AdminAction::Orders { action } => orders(api, action).await,
        AdminAction::Qr { action } => match action {
            QrAction::Show => emit(&api.qr_code().await?),
            QrAction::Upload { path } => {
                let upload = QrUpload::from_path(&path).await?;
                emit(&api.upload_qr(upload).await?)
            }
        },
    }
}

async fn watch_pending(session: &AdminSession) -> Result<(), CliError> {
    session.resume()?;
    let Some(mut badge) = session.subscribe_pending() else {
        return Ok(());
    };

    loop {
        tokio::select! {
            changed = badge.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *badge.borrow_and_update();
                info!(pending = state.count, badge = ?state.badge(), "Pending orders");
            }
            () = tokio::time::sleep(LIVENESS_CHECK) => {}
            () = interrupted() => break,
        }
        if !session.is_polling() {
            info!("Polling stopped; sign in again with `sf-cli admin login`");
            break;
        }
    }
    Ok(())
}

async fn inventory(api: &AdminApi, action: InventoryAction) -> Result<(), CliError> {
    match action {
        InventoryAction::Overview => emit(&api.inventory_overview().await?),
        InventoryAction::Stats => emit(&api.inventory_stats().await?),
        InventoryAction::LowStock { threshold } => emit(&api.low_stock(threshold).await?),
        InventoryAction::OutOfStock => emit(&api.out_of_stock().await?),
        InventoryAction::Movements { days } => emit(&api.stock_movements(days).await?),
        InventoryAction::Set {
            product_id,
            stock,
            reason,
        } => emit(
            &api.update_stock(&ProductId::new(product_id), stock, reason.as_deref())
                .await?,
        ),
        InventoryAction::Bulk { lines } => {
            api.bulk_update_stock(&lines).await?;
            info!(lines = lines.len(), "Stock updated");
            Ok(())
        }
    }
}

async fn offers(api: &AdminApi, action: AdminOfferAction) -> Result<(), CliError> {
    match action {
        AdminOfferAction::List => emit(&api.offers().await?),
        AdminOfferAction::Create {
            title,
            description,
            discount,
            code,
            inactive,
        } => {
            let draft = OfferDraft {
                title,
                description,
                discount_percentage: discount,
                code,
                is_active: !inactive,
                ..OfferDraft::default()
            };
            emit(&api.create_offer(&draft).await?)
        }
        AdminOfferAction::Toggle { offer_id } => {
            emit(&api.toggle_offer(&OfferId::new(offer_id)).await?)
        }
        AdminOfferAction::Delete { offer_id } => {
            api.delete_offer(&OfferId::new(offer_id)).await?;
            info!("Offer deleted");
            Ok(())
        }
    }
}

async fn orders(api: &AdminApi, action: AdminOrderAction) -> Result<(), CliError> {
    match action {
        AdminOrderAction::List => emit(&api.orders().await?),
        AdminOrderAction::Status { order_id, status } => emit(
            &api.update_order_status(&OrderId::new(order_id), status, None)
                .await?,
        ),
        AdminOrderAction::Delete { order_id } => {
            let message = api.delete_order(&OrderId::new(order_id)).await?;
            info!(message = ?message, "Order deleted");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stock_line() {
        let line = parse_stock_line("p1=25").unwrap();
        assert_eq!(line.product_id, ProductId::new("p1"));
        assert_eq!(line.stock, 25);

        assert!(parse_stock_line("p1").is_err());
        assert!(parse_stock_line("p1=-3").is_err());
        assert!(parse_stock_line("p1=lots").is_err());
    }
}
