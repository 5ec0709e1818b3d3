//! Catalog route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use tienda_core::CatalogRow;

use crate::error::Result;
use crate::state::AppState;

/// List the catalog, one row per product image.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CatalogRow>>> {
    let rows = state.catalog().list().await?;
    tracing::debug!(rows = rows.len(), "Serving catalog");
    Ok(Json(rows))
}
