//! Customer account commands.

use clap::Args;
use shopfront_client::Storefront;
use shopfront_client::auth::Registration;
use tracing::info;

use super::{CliError, emit, password};

const PASSWORD_ENV: &str = "SHOPFRONT_PASSWORD";

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    email: String,

    /// Account password (falls back to `SHOPFRONT_PASSWORD`)
    #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Display name
    #[arg(short, long)]
    name: String,

    /// Account email
    #[arg(short, long)]
    email: String,

    /// Password (falls back to `SHOPFRONT_PASSWORD`)
    #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,

    /// Password confirmation; defaults to the password
    #[arg(long)]
    confirm_password: Option<String>,
}

/// Sign in and merge the server cart and wishlist into local state.
pub async fn login(storefront: &Storefront, args: LoginArgs) -> Result<(), CliError> {
    let password = password(args.password, PASSWORD_ENV)?;
    let session = storefront.auth().login(&args.email, &password).await?;
    info!(user = %session.user.name, "Signed in");

    storefront.cart().sync_with_backend().await?;
    storefront.wishlist().load().await?;
    emit(&session.user)
}

pub async fn register(storefront: &Storefront, args: RegisterArgs) -> Result<(), CliError> {
    let password = password(args.password, PASSWORD_ENV)?;
    let confirm_password = args
        .confirm_password
        .map_or_else(|| password.clone(), secrecy::SecretString::from);
    let form = Registration {
        name: args.name,
        email: args.email,
        password,
        confirm_password,
    };
    let session = storefront.auth().register(&form).await?;
    info!(user = %session.user.name, "Account created");
    emit(&session.user)
}

pub fn logout(storefront: &Storefront) -> Result<(), CliError> {
    storefront.logout()?;
    info!("Signed out");
    Ok(())
}

pub async fn whoami(storefront: &Storefront) -> Result<(), CliError> {
    let profile = storefront.auth().refresh_profile().await?;
    emit(&profile)
}
