//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFRONT_API_URL` - Base URL of the storefront backend (e.g., `http://localhost:5000`)
//!
//! ## Optional
//! - `SHOPFRONT_STATE_DIR` - Directory for persisted client state (default: `.shopfront`)
//! - `SHOPFRONT_CURRENCY` - Display currency code (default: `INR`)
//! - `SHOPFRONT_OFFER_DELAY_MS` - Delay before the offer interstitial checks for offers (default: 3000)
//! - `SHOPFRONT_ADMIN_POLL_SECS` - Pending-order polling interval for admins (default: 30)
//! - `SHOPFRONT_CATALOG_TTL_SECS` - Product listing cache lifetime (default: 300)
//! - `SHOPFRONT_SEARCH_DEBOUNCE_MS` - Search input debounce (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use shopfront_core::CurrencyCode;
use thiserror::Error;
use url::Url;

/// File name of the local-storage document inside the state directory.
pub const LOCAL_STORAGE_FILE: &str = "local-storage.json";

const DEFAULT_OFFER_DELAY_MS: u64 = 3000;
const DEFAULT_ADMIN_POLL_SECS: u64 = 30;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; REST routes live under `<api_url>/api`
    pub api_url: Url,
    /// Directory holding the persisted local-storage file
    pub state_dir: PathBuf,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// Delay between mounting the offer interstitial and querying offers
    pub offer_delay: Duration,
    /// Interval between pending-order count polls in the admin shell
    pub admin_poll_interval: Duration,
    /// Time-to-live of cached product listings
    pub catalog_ttl: Duration,
    /// Quiet period before a search query is executed
    pub search_debounce: Duration,
    /// Sentry error tracking configuration
    pub sentry: SentryConfig,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when absent
    pub dsn: Option<String>,
    /// Environment tag attached to events
    pub environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration for the given backend with default timings.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            state_dir: PathBuf::from(".shopfront"),
            currency: CurrencyCode::default(),
            offer_delay: Duration::from_millis(DEFAULT_OFFER_DELAY_MS),
            admin_poll_interval: Duration::from_secs(DEFAULT_ADMIN_POLL_SECS),
            catalog_ttl: Duration::from_secs(DEFAULT_CATALOG_TTL_SECS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            sentry: SentryConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url("SHOPFRONT_API_URL", &get_required_env("SHOPFRONT_API_URL")?)?;
        let state_dir = PathBuf::from(get_env_or_default("SHOPFRONT_STATE_DIR", ".shopfront"));
        let currency = parse_currency(
            "SHOPFRONT_CURRENCY",
            &get_env_or_default("SHOPFRONT_CURRENCY", "INR"),
        )?;

        Ok(Self {
            api_url,
            state_dir,
            currency,
            offer_delay: Duration::from_millis(get_u64_or_default(
                "SHOPFRONT_OFFER_DELAY_MS",
                DEFAULT_OFFER_DELAY_MS,
            )?),
            admin_poll_interval: Duration::from_secs(get_u64_or_default(
                "SHOPFRONT_ADMIN_POLL_SECS",
                DEFAULT_ADMIN_POLL_SECS,
            )?),
            catalog_ttl: Duration::from_secs(get_u64_or_default(
                "SHOPFRONT_CATALOG_TTL_SECS",
                DEFAULT_CATALOG_TTL_SECS,
            )?),
            search_debounce: Duration::from_millis(get_u64_or_default(
                "SHOPFRONT_SEARCH_DEBOUNCE_MS",
                DEFAULT_SEARCH_DEBOUNCE_MS,
            )?),
            sentry: SentryConfig {
                dsn: get_optional_env("SENTRY_DSN"),
                environment: get_optional_env("SENTRY_ENVIRONMENT"),
            },
        })
    }

    /// Path of the local-storage file.
    #[must_use]
    pub fn local_storage_path(&self) -> PathBuf {
        self.state_dir.join(LOCAL_STORAGE_FILE)
    }

    /// Root of the REST routes, without a trailing slash.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api", self.api_url.as_str().trim_end_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a numeric environment variable with a default value.
fn get_u64_or_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| parse_u64(key, &raw))
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the backend URL, accepting only http(s).
fn parse_api_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{other}' (expected http or https)"),
        )),
    }
}

fn parse_currency(key: &str, raw: &str) -> Result<CurrencyCode, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "INR" => Ok(CurrencyCode::INR),
        "USD" => Ok(CurrencyCode::USD),
        "EUR" => Ok(CurrencyCode::EUR),
        "GBP" => Ok(CurrencyCode::GBP),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported currency '{other}'"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_accepts_http_and_https() {
        assert!(parse_api_url("K", "http://localhost:5000").is_ok());
        assert!(parse_api_url("K", " https://shop.example.in/ ").is_ok());
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        let err = parse_api_url("SHOPFRONT_API_URL", "ftp://shop.example.in").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "SHOPFRONT_API_URL"));
        assert!(parse_api_url("K", "not a url").is_err());
    }

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("K", " 3000 ").unwrap(), 3000);
        assert!(parse_u64("K", "-1").is_err());
        assert!(parse_u64("K", "soon").is_err());
    }

    #[test]
    fn test_parse_currency_is_case_insensitive() {
        assert_eq!(parse_currency("K", "usd").unwrap(), CurrencyCode::USD);
        assert!(parse_currency("K", "JPY").is_err());
    }

    #[test]
    fn test_api_root_strips_trailing_slash() {
        let config = ClientConfig::new(Url::parse("http://localhost:5000/").unwrap());
        assert_eq!(config.api_root(), "http://localhost:5000/api");

        let nested = ClientConfig::new(Url::parse("https://shop.example.in/backend").unwrap());
        assert_eq!(nested.api_root(), "https://shop.example.in/backend/api");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(Url::parse("http://localhost:5000").unwrap());
        assert_eq!(config.offer_delay, Duration::from_secs(3));
        assert_eq!(config.admin_poll_interval, Duration::from_secs(30));
        assert_eq!(config.currency, CurrencyCode::INR);
        assert_eq!(
            config.local_storage_path(),
            PathBuf::from(".shopfront").join(LOCAL_STORAGE_FILE)
        );
    }
}
