//! Product catalog behind the HTTP handlers.
//!
//! Handlers talk to a [`ProductCatalog`] trait object so the routes can be
//! exercised without `PostgreSQL`:
//!
//! - [`PgCatalog`] - reads the catalog tables through [`ProductRepository`]
//! - [`CachedCatalog`] - caches the catalog listing for 5 minutes (`moka`)
//! - [`InMemoryCatalog`] - fixed rows, for tests and local demos
//!
//! A cached catalog verifies payment amounts against the same snapshot it
//! lists, so a cart built from the listing always matches.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use tienda_core::{CatalogRow, ProductId};

use crate::db::{ProductRepository, RepositoryError};

const CATALOG_CACHE_KEY: &str = "catalog";
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// All catalog rows, one per product image.
    async fn list(&self) -> Result<Vec<CatalogRow>, RepositoryError>;

    /// Current unit prices of the given products. Unknown ids are omitted.
    async fn prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Catalog backed by the `PostgreSQL` catalog tables.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PgCatalog {
    async fn list(&self) -> Result<Vec<CatalogRow>, RepositoryError> {
        ProductRepository::new(&self.pool).list_catalog().await
    }

    async fn prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, RepositoryError> {
        ProductRepository::new(&self.pool).prices(ids).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        ProductRepository::new(&self.pool).ping().await
    }
}

/// Caches the catalog listing of an inner catalog.
pub struct CachedCatalog<C> {
    inner: C,
    cache: Cache<&'static str, Arc<[CatalogRow]>>,
}

impl<C: ProductCatalog> CachedCatalog<C> {
    /// Wrap `inner`, caching its listing for 5 minutes.
    #[must_use]
    pub fn new(inner: C) -> Self {
        Self::with_ttl(inner, CATALOG_TTL)
    }

    /// Wrap `inner` with a custom time-to-live.
    #[must_use]
    pub fn with_ttl(inner: C, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { inner, cache }
    }
}

#[async_trait]
impl<C: ProductCatalog> ProductCatalog for CachedCatalog<C> {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<CatalogRow>, RepositoryError> {
        if let Some(rows) = self.cache.get(&CATALOG_CACHE_KEY).await {
            debug!("Cache hit for catalog");
            return Ok(rows.to_vec());
        }

        let rows = self.inner.list().await?;
        debug!(rows = rows.len(), "Catalog loaded");

        self.cache
            .insert(CATALOG_CACHE_KEY, Arc::from(rows.clone()))
            .await;

        Ok(rows)
    }

    async fn prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, RepositoryError> {
        Ok(prices_of(&self.list().await?, ids))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.inner.ping().await
    }
}

fn prices_of(rows: &[CatalogRow], ids: &[ProductId]) -> HashMap<ProductId, Decimal> {
    rows.iter()
        .filter(|row| ids.contains(&row.productoid))
        .map(|row| (row.productoid, row.precio))
        .collect()
}

/// Catalog holding a fixed set of rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    rows: Vec<CatalogRow>,
}

impl InMemoryCatalog {
    #[must_use]
    pub const fn new(rows: Vec<CatalogRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn list(&self) -> Result<Vec<CatalogRow>, RepositoryError> {
        Ok(self.rows.clone())
    }

    async fn prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, RepositoryError> {
        Ok(prices_of(&self.rows, ids))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
