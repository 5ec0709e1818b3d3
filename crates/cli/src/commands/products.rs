//! Catalog listing.

use tienda_checkout::CatalogClient;
use tienda_checkout::config::backend_url_from_env;

/// Print the catalog served by the storefront backend, one product per line.
///
/// # Errors
///
/// Returns an error if the backend URL is invalid or the catalog cannot be
/// fetched.
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = CatalogClient::new(backend_url_from_env()?);
    let products = catalog.products().await?;

    #[allow(clippy::print_stdout)]
    {
        for product in &products {
            println!(
                "{:>6}  {:>10}  {}",
                product.id.to_string(),
                product.price.to_string(),
                product.name
            );
        }
        println!("{} products", products.len());
    }
    Ok(())
}
