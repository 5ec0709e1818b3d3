//! Scripted checkout.
//!
//! Fills a cart from the live catalog, pays through the storefront backend
//! and Stripe, and saves `receipt.xml` into `TIENDA_RECEIPT_DIR`.
//!
//! # Environment Variables
//!
//! See [`tienda_checkout::CheckoutConfig`].

use std::sync::Arc;

use tienda_checkout::{
    CardDetails, CartStore, CatalogClient, CheckoutConfig, DirectorySink, HttpIntentBackend,
    PaymentGateway, ReceiptGenerator, StripeConfirmClient,
};
use tienda_core::ProductId;

/// Buy the given products.
///
/// Each id adds one cart entry; repeat an id to buy it twice.
///
/// # Errors
///
/// Returns an error for unknown product ids, configuration problems, or a
/// failed payment.
pub async fn run(
    product_ids: &[i32],
    billing_name: &str,
    card: &CardDetails,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = CheckoutConfig::from_env()?;

    let catalog = CatalogClient::new(config.backend_url.clone());
    let products = catalog.products().await?;

    let cart = CartStore::new();
    for &id in product_ids {
        let id = ProductId::new(id);
        let product = products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| format!("Unknown product: {id}"))?;
        cart.add(product.clone());
    }

    let gateway = PaymentGateway::new(
        cart.clone(),
        Arc::new(HttpIntentBackend::new(config.backend_url.clone())),
        Arc::new(StripeConfirmClient::new(
            config.stripe_api_base.clone(),
            config.publishable_key.clone(),
        )),
        ReceiptGenerator::new(Arc::new(DirectorySink::new(config.receipt_dir.clone()))),
        config.currency,
    );

    let summary = gateway.pay(card, billing_name).await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Payment {} {}: {} items, total {} {}",
            summary.intent_id, summary.status, summary.item_count, summary.total, config.currency
        );
        println!(
            "Receipt saved to {}",
            config
                .receipt_dir
                .join(tienda_checkout::receipt::RECEIPT_FILE_NAME)
                .display()
        );
    }
    Ok(())
}
