//! Product catalog with response caching and debounced search.
//!
//! Catalog reads are cached with `moka` for the configured TTL (5 minutes by
//! default). Search filters the cached listing by name, category and
//! description; [`ProductSearch`] debounces keystrokes so only the last query
//! of a burst runs.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use shopfront_core::ProductId;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, ApiError, Product};
use crate::timer::Debouncer;

/// Listing size fetched for client-side search.
const SEARCH_LISTING_LIMIT: u32 = 100;

/// Maximum cached responses.
const CACHE_CAPACITY: u64 = 1000;

#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

// =============================================================================
// Catalog
// =============================================================================

/// Cached, read-only view of the product catalog.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    api: ApiClient,
    cache: Cache<String, CacheValue>,
}

impl Catalog {
    /// Create a catalog whose entries live for `ttl`.
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self {
            inner: Arc::new(CatalogInner { api, cache }),
        }
    }

    /// One page of the product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, page: u32, limit: u32) -> Result<Arc<Vec<Product>>, ApiError> {
        let key = format!("products:{page}:{limit}");
        self.list(key, || self.inner.api.products(page, limit)).await
    }

    /// Products of one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn by_category(&self, category: &str) -> Result<Arc<Vec<Product>>, ApiError> {
        let key = format!("category:{category}");
        self.list(key, || self.inner.api.products_by_category(category))
            .await
    }

    /// Featured products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn featured(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        self.list("featured".to_string(), || self.inner.api.featured_products())
            .await
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.inner.api.product(id).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Products matching `query` in the first listing page.
    ///
    /// An empty query matches nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let listing = self.products(1, SEARCH_LISTING_LIMIT).await?;
        Ok(filter_products(&listing, query))
    }

    /// Drop a cached product.
    pub async fn invalidate_product(&self, id: &ProductId) {
        self.inner.cache.invalidate(&format!("product:{id}")).await;
    }

    /// Drop every cached response.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    async fn list<F, Fut>(&self, key: String, fetch: F) -> Result<Arc<Vec<Product>>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<Product>, ApiError>>,
    {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!(key, "Cache hit for product list");
            return Ok(products);
        }

        let products = Arc::new(fetch().await?);
        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }
}

/// Case-insensitive match on name, category or description.
#[must_use]
pub fn filter_products(products: &[Product], query: &str) -> Vec<Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

// =============================================================================
// ProductSearch
// =============================================================================

/// Results of the most recent completed search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub products: Vec<Product>,
}

/// Debounced search box.
///
/// Each [`ProductSearch::set_query`] supersedes the previous one; results are
/// published on a watch channel once the input has been quiet for the
/// debounce window.
pub struct ProductSearch {
    catalog: Catalog,
    debouncer: Debouncer,
    results: watch::Sender<SearchResults>,
}

impl ProductSearch {
    /// Create a search box with the given debounce window.
    #[must_use]
    pub fn new(catalog: Catalog, window: Duration) -> Self {
        let (results, _) = watch::channel(SearchResults::default());
        Self {
            catalog,
            debouncer: Debouncer::new(window),
            results,
        }
    }

    /// Subscribe to published results.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchResults> {
        self.results.subscribe()
    }

    /// Latest published results.
    #[must_use]
    pub fn current(&self) -> SearchResults {
        self.results.borrow().clone()
    }

    /// Update the query. Must be called from within a tokio runtime.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let catalog = self.catalog.clone();
        let results = self.results.clone();
        self.debouncer.call(async move {
            let products = match catalog.search(&query).await {
                Ok(products) => products,
                Err(e) => {
                    warn!(error = %e, query, "Product search failed");
                    Vec::new()
                }
            };
            results.send_replace(SearchResults { query, products });
        });
    }

    /// Drop any pending query.
    pub fn cancel(&self) {
        self.debouncer.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(name: &str, category: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "_id": name.to_lowercase().replace(' ', "-"),
            "name": name,
            "price": 999,
            "category": category,
            "description": "Handwoven cotton",
        }))
        .unwrap()
    }

    #[test]
    fn test_filter_matches_name_category_description() {
        let products = vec![
            product("Linen Shirt", "shirts"),
            product("Denim Jacket", "outerwear"),
            product("Silk Kurta", "ethnic"),
        ];

        let names = |q: &str| {
            filter_products(&products, q)
                .into_iter()
                .map(|p| p.name)
                .collect::<Vec<_>>()
        };

        assert_eq!(names("shirt"), vec!["Linen Shirt"]);
        assert_eq!(names("OUTER"), vec!["Denim Jacket"]);
        assert_eq!(names("cotton").len(), 3);
        assert!(names("   ").is_empty());
        assert!(names("sneaker").is_empty());
    }
}
