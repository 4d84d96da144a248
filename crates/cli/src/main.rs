//! Shopfront CLI - drive the storefront and back office from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in as a customer (password read from SHOPFRONT_PASSWORD if omitted)
//! sf-cli login -e asha@example.com
//!
//! # Browse and shop
//! sf-cli products --category tees
//! sf-cli cart add 64f0c2 --size M
//! sf-cli cart show
//! sf-cli checkout cod --full-name "Asha Rao" --phone 9876543210 ...
//!
//! # Back office
//! sf-cli admin login -e admin@example.com
//! sf-cli admin pending --watch
//! sf-cli admin qr upload ./upi.png
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_API_URL` - Backend base URL (required)
//! - `SHOPFRONT_STATE_DIR` - Where local storage is persisted
//! - `SENTRY_DSN` - Enables error reporting
//! - `RUST_LOG` - Log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shopfront_client::{ClientConfig, Storefront};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CliError, account, admin, shop};

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(author, version, about = "Shopfront storefront and back-office CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as a customer
    Login(account::LoginArgs),
    /// Create a customer account
    Register(account::RegisterArgs),
    /// Sign out
    Logout,
    /// Show the signed-in customer
    Whoami,
    /// Browse the catalog
    Products(shop::ProductsArgs),
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: shop::CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: shop::WishlistAction,
    },
    /// Read and write product reviews
    Reviews {
        #[command(subcommand)]
        action: shop::ReviewAction,
    },
    /// Promotional offers
    Offers {
        #[command(subcommand)]
        action: shop::OfferAction,
    },
    /// Place an order from the cart
    Checkout {
        #[command(subcommand)]
        action: shop::CheckoutAction,
    },
    /// List or cancel your orders
    Orders {
        #[command(subcommand)]
        action: shop::OrderAction,
    },
    /// Back-office commands
    Admin {
        #[command(subcommand)]
        action: admin::AdminAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sf_cli=info,shopfront_client=info,shopfront_admin=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads its env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Client(e)) => {
            shopfront_client::error::report(&e);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let storefront = Storefront::open(config)?;

    match cli.command {
        Commands::Login(args) => account::login(&storefront, args).await,
        Commands::Register(args) => account::register(&storefront, args).await,
        Commands::Logout => account::logout(&storefront),
        Commands::Whoami => account::whoami(&storefront).await,
        Commands::Products(args) => shop::products(&storefront, args).await,
        Commands::Cart { action } => shop::cart(&storefront, action).await,
        Commands::Wishlist { action } => shop::wishlist(&storefront, action).await,
        Commands::Reviews { action } => shop::reviews(&storefront, action).await,
        Commands::Offers { action } => shop::offers(&storefront, action).await,
        Commands::Checkout { action } => shop::checkout(&storefront, action).await,
        Commands::Orders { action } => shop::orders(&storefront, action).await,
        Commands::Admin { action } => admin::run(&storefront, action).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bulk_update_parses_lines() {
        let cli = Cli::try_parse_from([
            "sf-cli", "admin", "inventory", "bulk", "p1=5", "p2=0",
        ]);
        assert!(cli.is_ok());
        assert!(Cli::try_parse_from(["sf-cli", "admin", "inventory", "bulk", "p1"]).is_err());
    }
}
