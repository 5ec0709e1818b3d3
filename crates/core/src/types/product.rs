//! Catalog products.
//!
//! The storefront serves [`CatalogRow`]s, one per product image, with the
//! lower-cased column names of the catalog tables. Clients reduce them to
//! [`Product`]s, which is all the cart and checkout need.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// A product as selected into the cart. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in the store currency's standard unit.
    pub price: Decimal,
    pub image_url: String,
}

/// A catalog row as served by `GET /api/products`.
///
/// Products without images have a null `urlimagen`; products with several
/// images appear once per image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct CatalogRow {
    pub productoid: ProductId,
    pub nombreproducto: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Serialized as a numeric string (e.g. `"149.90"`).
    pub precio: Decimal,
    #[serde(default)]
    pub materiales: Option<String>,
    #[serde(default)]
    pub peso: Option<Decimal>,
    #[serde(default)]
    pub altura: Option<Decimal>,
    #[serde(default)]
    pub ancho: Option<Decimal>,
    #[serde(default)]
    pub profundidad: Option<Decimal>,
    #[serde(default)]
    pub nombrecategoria: Option<String>,
    #[serde(default)]
    pub nombremarca: Option<String>,
    #[serde(default)]
    pub urlimagen: Option<String>,
}

impl From<CatalogRow> for Product {
    fn from(row: CatalogRow) -> Self {
        Self {
            id: row.productoid,
            name: row.nombreproducto,
            price: row.precio,
            image_url: row.urlimagen.unwrap_or_default(),
        }
    }
}

/// Collapse catalog rows into products, keeping the first row seen per id.
#[must_use]
pub fn products_from_rows(rows: Vec<CatalogRow>) -> Vec<Product> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.productoid))
        .map(Product::from)
        .collect()
}
