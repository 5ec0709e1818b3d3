//! Product repository for catalog reads.
//!
//! Queries are plain runtime queries (`query_as`) so the crate builds without a
//! live database. Unquoted identifiers fold to lower case in `PostgreSQL`, which
//! gives the catalog rows their lower-cased column names.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;

use tienda_core::{CatalogRow, ProductId};

use super::RepositoryError;

const CATALOG_QUERY: &str = r"
    SELECT
        p.ProductoID,
        p.NombreProducto,
        p.Descripcion,
        p.Precio,
        p.Materiales,
        p.Peso,
        p.Altura,
        p.Ancho,
        p.Profundidad,
        c.NombreCategoria,
        m.NombreMarca,
        ip.URLImagen
    FROM Productos p
    JOIN Categorias c ON p.CategoriaID = c.CategoriaID
    JOIN Marcas m ON p.MarcaID = m.MarcaID
    LEFT JOIN ImagenesProducto ip ON p.ProductoID = ip.ProductoID
    ORDER BY p.ProductoID, ip.ImagenID
";

const PRICES_QUERY: &str = r"
    SELECT ProductoID, Precio
    FROM Productos
    WHERE ProductoID = ANY($1)
";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every catalog row, one per product image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_catalog(&self) -> Result<Vec<CatalogRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, CatalogRow>(CATALOG_QUERY)
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    /// Look up current prices for the given products.
    ///
    /// Ids that do not exist are absent from the returned map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows: Vec<(ProductId, Decimal)> = sqlx::query_as(PRICES_QUERY)
            .bind(raw_ids)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Check that the database answers queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(self.pool).await?;
        Ok(())
    }
}
