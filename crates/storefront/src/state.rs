//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::{CachedCatalog, PgCatalog, ProductCatalog};
use crate::config::StorefrontConfig;
use crate::stripe::{PaymentProcessor, StripeClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog, the payment processor, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<dyn ProductCatalog>,
    payments: Option<Arc<dyn PaymentProcessor>>,
}

impl AppState {
    /// Create the production state: cached `PostgreSQL` catalog and, when a
    /// secret key is configured, the Stripe client.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let catalog = Arc::new(CachedCatalog::new(PgCatalog::new(pool)));
        let payments = StripeClient::from_config(&config.stripe)
            .map(|client| Arc::new(client) as Arc<dyn PaymentProcessor>);

        Self::from_parts(config, catalog, payments)
    }

    /// Create a state from explicit collaborators.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        catalog: Arc<dyn ProductCatalog>,
        payments: Option<Arc<dyn PaymentProcessor>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                payments,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn ProductCatalog {
        self.inner.catalog.as_ref()
    }

    /// Get the payment processor, if a secret key is configured.
    #[must_use]
    pub fn payments(&self) -> Option<&dyn PaymentProcessor> {
        self.inner.payments.as_deref()
    }
}
