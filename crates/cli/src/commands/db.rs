//! Database connectivity check.

use secrecy::ExposeSecret;
use sqlx::PgPool;

use tienda_storefront::config::database_url_from_env;
use tienda_storefront::db::ProductRepository;

/// Connect to the storefront database and run a trivial query.
///
/// # Errors
///
/// Returns an error if the database URL is missing or the database is
/// unreachable.
pub async fn check() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;
    ProductRepository::new(&pool).ping().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Connected to the PostgreSQL database successfully!");
    }
    Ok(())
}
