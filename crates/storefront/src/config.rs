//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Database (one of)
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `DATABASE_URL` - generic fallback
//! - `POSTGRES_DB`, `POSTGRES_USER`, `POSTGRES_PASSWORD`, plus optional
//!   `POSTGRES_HOST` (default: postgres) and `POSTGRES_PORT` (default: 5432)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CURRENCY` - Store currency (default: usd)
//! - `STRIPE_SECRET_KEY` - Stripe secret key; payment intents fail with 500 without it
//! - `STRIPE_PUBLISHABLE_KEY` - Stripe publishable key handed to clients
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use tienda_core::CurrencyCode;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default Stripe REST API base URL.
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Currency the catalog is priced in
    pub currency: CurrencyCode,
    /// Stripe API configuration
    pub stripe: StripeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Stripe API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret key (server-side only). `None` disables payment intents.
    pub secret_key: Option<SecretString>,
    /// Publishable key (safe to expose to clients)
    pub publishable_key: Option<String>,
    /// REST API base URL, overridable for test doubles
    pub api_base: Url,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field(
                "secret_key",
                &self.secret_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("publishable_key", &self.publishable_key)
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = database_url_from_env()?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let currency = get_env_or_default("STOREFRONT_CURRENCY", "usd")
            .parse::<CurrencyCode>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_CURRENCY".to_string(), e.to_string())
            })?;

        let stripe = StripeConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            currency,
            stripe,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Whether payment intents can be created (a secret key is configured).
    #[must_use]
    pub const fn payments_enabled(&self) -> bool {
        self.stripe.secret_key.is_some()
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret_key = get_optional_env("STRIPE_SECRET_KEY")
            .map(|value| {
                validate_secret_strength(&value, "STRIPE_SECRET_KEY")?;
                Ok::<_, ConfigError>(SecretString::from(value))
            })
            .transpose()?;

        let api_base = get_env_or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE);
        let api_base = Url::parse(&api_base).map_err(|e| {
            ConfigError::InvalidEnvVar("STRIPE_API_BASE".to_string(), e.to_string())
        })?;

        Ok(Self {
            secret_key,
            publishable_key: get_optional_env("STRIPE_PUBLISHABLE_KEY"),
            api_base,
        })
    }
}

/// Resolve the database URL from the environment.
///
/// Tries `STOREFRONT_DATABASE_URL`, then `DATABASE_URL`, then assembles one
/// from the `POSTGRES_*` variables used by the database container.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if none of the sources is complete.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var("STOREFRONT_DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }

    let host = get_env_or_default("POSTGRES_HOST", "postgres");
    let port = get_env_or_default("POSTGRES_PORT", "5432")
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar("POSTGRES_PORT".to_string(), e.to_string()))?;
    let database = get_required_env("POSTGRES_DB")?;
    let user = get_required_env("POSTGRES_USER")?;
    let password = SecretString::from(get_required_env("POSTGRES_PASSWORD")?);

    postgres_url(&host, port, &database, &user, &password)
}

/// Build a `postgres://` URL, percent-encoding the credentials.
fn postgres_url(
    host: &str,
    port: u16,
    database: &str,
    user: &str,
    password: &SecretString,
) -> Result<SecretString, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("POSTGRES_HOST".to_string(), reason);

    let mut url = Url::parse(&format!("postgres://{host}:{port}/"))
        .map_err(|e| invalid(e.to_string()))?;
    url.set_path(&format!("/{database}"));
    url.set_username(user)
        .map_err(|()| invalid("cannot carry credentials".to_string()))?;
    url.set_password(Some(password.expose_secret()))
        .map_err(|()| invalid("cannot carry credentials".to_string()))?;

    Ok(SecretString::from(url.to_string()))
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
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are long random strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key from the Stripe dashboard."
            ),
        ));
    }

    Ok(())
}
