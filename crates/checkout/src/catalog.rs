//! Catalog client for the storefront backend.

use thiserror::Error;
use tracing::instrument;
use url::Url;

use tienda_core::{CatalogRow, ErrorBody, Product, products_from_rows};

/// Errors fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("Catalog request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Invalid catalog response: {0}")]
    Parse(String),
}

/// Reads products from `GET /api/products`.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Share an existing HTTP client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Raw catalog rows, one per product image.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend reports an error, or
    /// the body is not a list of catalog rows.
    #[instrument(skip(self))]
    pub async fn rows(&self) -> Result<Vec<CatalogRow>, CatalogError> {
        let response = self.client.get(self.endpoint("/api/products")).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let rows: Vec<CatalogRow> =
            serde_json::from_str(&body).map_err(|e| CatalogError::Parse(e.to_string()))?;
        tracing::debug!(rows = rows.len(), "Catalog fetched");
        Ok(rows)
    }

    /// Products in catalog order, one per product id.
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::rows`].
    pub async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(products_from_rows(self.rows().await?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let client = CatalogClient::new(Url::parse("http://localhost:3000/").unwrap());
        assert_eq!(
            client.endpoint("/api/products"),
            "http://localhost:3000/api/products"
        );
    }
}
