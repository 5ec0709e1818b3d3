//! Checkout client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STRIPE_PUBLISHABLE_KEY` - Stripe publishable key (`pk_...`)
//!
//! ## Optional
//! - `TIENDA_BACKEND_URL` - Storefront backend (default: <http://localhost:3000>)
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `TIENDA_CURRENCY` - Checkout currency (default: usd)
//! - `TIENDA_RECEIPT_DIR` - Directory receipts are saved to (default: `.`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use tienda_core::CurrencyCode;

const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Checkout client configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Storefront backend base URL
    pub backend_url: Url,
    /// Publishable key used to confirm payments with Stripe
    pub publishable_key: String,
    /// Stripe API base URL
    pub stripe_api_base: Url,
    pub currency: CurrencyCode,
    /// Where `receipt.xml` is written
    pub receipt_dir: PathBuf,
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the publishable key is missing or is a secret
    /// key, or if a URL or the currency cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let publishable_key = var("STRIPE_PUBLISHABLE_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("STRIPE_PUBLISHABLE_KEY".to_string()))?;
        if publishable_key.starts_with("sk_") || publishable_key.starts_with("rk_") {
            return Err(ConfigError::InsecureSecret(
                "STRIPE_PUBLISHABLE_KEY".to_string(),
                "secret keys must never be used by the checkout client".to_string(),
            ));
        }

        let backend_url = parse_url(
            "TIENDA_BACKEND_URL",
            &var("TIENDA_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
        )?;
        let stripe_api_base = parse_url(
            "STRIPE_API_BASE",
            &var("STRIPE_API_BASE").unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
        )?;
        let currency = var("TIENDA_CURRENCY")
            .unwrap_or_else(|| "usd".to_string())
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("TIENDA_CURRENCY".to_string(), e.to_string()))?;
        let receipt_dir = PathBuf::from(var("TIENDA_RECEIPT_DIR").unwrap_or_else(|| ".".to_string()));

        Ok(Self {
            backend_url,
            publishable_key,
            stripe_api_base,
            currency,
            receipt_dir,
        })
    }
}

/// Storefront backend URL from `TIENDA_BACKEND_URL`, for tools that only
/// read the catalog.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value is not a URL.
pub fn backend_url_from_env() -> Result<Url, ConfigError> {
    let _ = dotenvy::dotenv();
    let value = std::env::var("TIENDA_BACKEND_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    parse_url("TIENDA_BACKEND_URL", &value)
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CheckoutConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CheckoutConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STRIPE_PUBLISHABLE_KEY", "pk_test_51Habc")]).unwrap();
        assert_eq!(config.backend_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.stripe_api_base.as_str(), "https://api.stripe.com/");
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(config.receipt_dir, PathBuf::from("."));
    }

    #[test]
    fn test_publishable_key_required() {
        let result = load(&[("STRIPE_PUBLISHABLE_KEY", "  ")]);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_secret_key_rejected() {
        let result = load(&[("STRIPE_PUBLISHABLE_KEY", "sk_live_51Habc")]);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STRIPE_PUBLISHABLE_KEY", "pk_test_51Habc"),
            ("TIENDA_BACKEND_URL", "http://shop.internal:8080"),
            ("TIENDA_CURRENCY", "MXN"),
            ("TIENDA_RECEIPT_DIR", "/tmp/receipts"),
        ])
        .unwrap();
        assert_eq!(config.backend_url.as_str(), "http://shop.internal:8080/");
        assert_eq!(config.currency, CurrencyCode::MXN);
        assert_eq!(config.receipt_dir, PathBuf::from("/tmp/receipts"));
    }

    #[test]
    fn test_invalid_currency() {
        let result = load(&[
            ("STRIPE_PUBLISHABLE_KEY", "pk_test_51Habc"),
            ("TIENDA_CURRENCY", "doubloons"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }
}
