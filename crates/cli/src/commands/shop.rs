//! Shopping commands: catalog, cart, wishlist, reviews, offers, checkout.

use std::time::Duration;

use clap::{Args, Subcommand};
use serde_json::json;
use shopfront_client::Storefront;
use shopfront_client::api::ShippingAddress;
use shopfront_core::{OrderId, ProductId, ReviewId};
use tracing::info;

use super::{CliError, emit, interrupted};

#[derive(Args)]
pub struct ProductsArgs {
    /// Show a single product
    #[arg(long, conflicts_with_all = ["category", "featured", "search"])]
    id: Option<String>,

    /// Filter by category
    #[arg(short, long)]
    category: Option<String>,

    /// Only featured products
    #[arg(long)]
    featured: bool,

    /// Match name or category
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 20)]
    limit: u32,
}

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart and its totals
    Show,
    /// Add one unit of a product
    Add {
        product_id: String,
        #[arg(short, long)]
        size: String,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        product_id: String,
        #[arg(short, long)]
        size: String,
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        product_id: String,
        #[arg(short, long)]
        size: String,
    },
    /// Empty the cart
    Clear,
    /// Push local lines to the server cart
    Sync,
}

#[derive(Subcommand)]
pub enum WishlistAction {
    /// List wishlisted product ids
    Show,
    /// Add or remove a product
    Toggle { product_id: String },
}

#[derive(Subcommand)]
pub enum ReviewAction {
    /// List a page of reviews with stats
    List {
        product_id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Review a product
    Add {
        product_id: String,
        #[arg(short, long)]
        rating: i64,
        #[arg(short, long)]
        comment: String,
    },
    /// Edit your review
    Edit {
        product_id: String,
        review_id: String,
        #[arg(short, long)]
        rating: i64,
        #[arg(short, long)]
        comment: String,
    },
    /// Delete your review
    Delete { product_id: String, review_id: String },
}

#[derive(Subcommand)]
pub enum OfferAction {
    /// Wait for the offer interstitial as a visitor would see it
    Watch {
        /// Route the visitor is on
        #[arg(long, default_value = "/")]
        route: String,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
    /// Show the first live offer now, ignoring what was already seen
    Show,
}

#[derive(Subcommand)]
pub enum CheckoutAction {
    /// Place a cash-on-delivery order
    Cod(AddressArgs),
}

#[derive(Subcommand)]
pub enum OrderAction {
    /// List your orders
    List,
    /// Show one order
    Show { order_id: String },
    /// Cancel a pending or processing order
    Cancel { order_id: String },
}

#[derive(Args)]
pub struct AddressArgs {
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    address_line: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    state: String,
    #[arg(long)]
    pincode: String,
    #[arg(long, default_value = "India")]
    country: String,
}

impl From<AddressArgs> for ShippingAddress {
    fn from(args: AddressArgs) -> Self {
        Self {
            full_name: args.full_name,
            phone: args.phone,
            address_line: args.address_line,
            city: args.city,
            state: args.state,
            pincode: args.pincode,
            country: args.country,
        }
    }
}

pub async fn products(storefront: &Storefront, args: ProductsArgs) -> Result<(), CliError> {
    let catalog = storefront.catalog();
    if let Some(id) = args.id {
        return emit(&catalog.product(&ProductId::new(id)).await?);
    }
    let products = match (args.search, args.category) {
        (Some(query), _) => catalog.search(&query).await?,
        (None, Some(category)) => catalog.by_category(&category).await?.to_vec(),
        (None, None) if args.featured => catalog.featured().await?.to_vec(),
        (None, None) => catalog.products(args.page, args.limit).await?.to_vec(),
    };
    emit(&products)
}

pub async fn cart(storefront: &Storefront, action: CartAction) -> Result<(), CliError> {
    let cart = storefront.cart();
    match action {
        CartAction::Show => {
            if storefront.auth().is_authenticated() {
                cart.refresh().await?;
            }
        }
        CartAction::Add { product_id, size } => {
            let product = storefront
                .catalog()
                .product(&ProductId::new(product_id))
                .await?;
            cart.add_item(&product, &size).await?;
        }
        CartAction::Update {
            product_id,
            size,
            quantity,
        } => {
            cart.update_quantity(&ProductId::new(product_id), &size, quantity)
                .await?;
        }
        CartAction::Remove { product_id, size } => {
            cart.remove_item(&ProductId::new(product_id), &size).await;
        }
        CartAction::Clear => {
            cart.clear_cart().await;
        }
        CartAction::Sync => cart.sync_with_backend().await?,
    }

    let currency = storefront.config().currency;
    emit(&json!({
        "items": cart.items(),
        "totalItems": cart.total_items(),
        "totalPrice": cart.total_price().display(currency),
    }))
}

pub async fn wishlist(storefront: &Storefront, action: WishlistAction) -> Result<(), CliError> {
    let wishlist = storefront.wishlist();
    match action {
        WishlistAction::Show => {
            let ids = wishlist.load().await?;
            emit(&ids)
        }
        WishlistAction::Toggle { product_id } => {
            let product_id = ProductId::new(product_id);
            wishlist.load().await?;
            let added = wishlist.toggle(&product_id).await?;
            emit(&json!({ "productId": product_id, "wishlisted": added }))
        }
    }
}

pub async fn reviews(storefront: &Storefront, action: ReviewAction) -> Result<(), CliError> {
    let (panel, page) = match &action {
        ReviewAction::List { product_id, page } => {
            (storefront.reviews(ProductId::new(product_id.as_str())), *page)
        }
        ReviewAction::Add { product_id, .. }
        | ReviewAction::Edit { product_id, .. }
        | ReviewAction::Delete { product_id, .. } => {
            (storefront.reviews(ProductId::new(product_id.as_str())), 1)
        }
    };
    panel.load(page).await?;

    match action {
        ReviewAction::List { .. } => {}
        ReviewAction::Add {
            rating, comment, ..
        } => panel.submit(rating, &comment).await?,
        ReviewAction::Edit {
            review_id,
            rating,
            comment,
            ..
        } => panel.edit(&ReviewId::new(review_id), rating, &comment).await?,
        ReviewAction::Delete { review_id, .. } => panel.delete(&ReviewId::new(review_id)).await?,
    }

    emit(&json!({
        "reviews": panel.reviews(),
        "pagination": panel.pagination(),
        "stats": panel.stats(),
    }))
}

pub async fn offers(storefront: &Storefront, action: OfferAction) -> Result<(), CliError> {
    let modal = storefront.offer_modal();
    match action {
        OfferAction::Show => {
            let offer = modal.force_check().await;
            emit(&offer)
        }
        OfferAction::Watch { route, timeout } => {
            let mut shown = modal.subscribe();
            modal.set_route(&route);
            modal.mount();
            info!(route = %route, "Waiting for an offer");

            let wait = async {
                while shown.changed().await.is_ok() {
                    if let Some(offer) = shown.borrow_and_update().clone() {
                        return Some(offer);
                    }
                }
                None
            };

            let offer = tokio::select! {
                offer = wait => offer,
                () = tokio::time::sleep(Duration::from_secs(timeout)) => None,
                () = interrupted() => None,
            };
            modal.unmount();
            emit(&offer)
        }
    }
}

pub async fn checkout(storefront: &Storefront, action: CheckoutAction) -> Result<(), CliError> {
    match action {
        CheckoutAction::Cod(address) => {
            let order = storefront
                .checkout()
                .place_cod_order(&address.into())
                .await?;
            emit(&order)
        }
    }
}

pub async fn orders(storefront: &Storefront, action: OrderAction) -> Result<(), CliError> {
    let checkout = storefront.checkout();
    match action {
        OrderAction::List => emit(&checkout.orders().await?),
        OrderAction::Show { order_id } => emit(&checkout.order(&OrderId::new(order_id)).await?),
        OrderAction::Cancel { order_id } => {
            emit(&checkout.cancel_order(&OrderId::new(order_id)).await?)
        }
    }
}
