//! End-to-end checkout: catalog client, cart, storefront backend, and the
//! processor, all over HTTP.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{Value, json};

use tienda_checkout::receipt::RECEIPT_FILE_NAME;
use tienda_checkout::{
    CardDetails, CartStore, CatalogClient, CheckoutError, DirectorySink, HttpIntentBackend,
    PaymentGateway, ReceiptGenerator, StripeConfirmClient,
};
use tienda_core::{CurrencyCode, ProductId};
use tienda_integration_tests::{DECLINED_CARD, PUBLISHABLE_KEY, TestStack, VALID_CARD};

struct Client {
    cart: CartStore,
    gateway: PaymentGateway,
    receipts: tempfile::TempDir,
}

fn client(stack: &TestStack) -> Client {
    let cart = CartStore::new();
    let receipts = tempfile::tempdir().unwrap();
    let gateway = PaymentGateway::new(
        cart.clone(),
        Arc::new(HttpIntentBackend::new(stack.storefront_url.clone())),
        Arc::new(StripeConfirmClient::new(
            stack.stripe_url.clone(),
            PUBLISHABLE_KEY,
        )),
        ReceiptGenerator::new(Arc::new(DirectorySink::new(receipts.path()))),
        CurrencyCode::USD,
    );
    Client {
        cart,
        gateway,
        receipts,
    }
}

async fn fill_cart(stack: &TestStack, cart: &CartStore, ids: &[i32]) {
    let products = CatalogClient::new(stack.storefront_url.clone())
        .products()
        .await
        .unwrap();
    for &id in ids {
        let product = products
            .iter()
            .find(|p| p.id == ProductId::new(id))
            .unwrap();
        cart.add(product.clone());
    }
}

fn card(number: &str) -> CardDetails {
    CardDetails::new(number, 12, 2030, "123")
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_rows_and_products() {
    let stack = TestStack::start().await.unwrap();
    let catalog = CatalogClient::new(stack.storefront_url.clone());

    let rows = catalog.rows().await.unwrap();
    assert_eq!(rows.len(), 4);

    let products = catalog.products().await.unwrap();
    let ids: Vec<i32> = products.iter().map(|p| p.id.as_i32()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(products[0].image_url, "/img/taza-1.jpg");
    assert_eq!(products[2].image_url, "");
    assert_eq!(products[2].price, Decimal::new(4599, 2));
}

#[tokio::test]
async fn test_catalog_wire_format_uses_numeric_strings() {
    let stack = TestStack::start().await.unwrap();

    let body: Value = reqwest::get(stack.storefront("/api/products"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body[0]["productoid"], 1);
    assert_eq!(body[0]["precio"], "12.50");
    assert_eq!(body[3]["urlimagen"], Value::Null);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_successful_checkout() {
    let stack = TestStack::start().await.unwrap();
    let client = client(&stack);
    fill_cart(&stack, &client.cart, &[1, 3, 1]).await;

    let summary = client
        .gateway
        .pay(&card(VALID_CARD), "Ana López")
        .await
        .unwrap();

    assert_eq!(summary.status, "succeeded");
    assert_eq!(summary.item_count, 3);
    assert_eq!(summary.total, Decimal::new(7099, 2));

    let intents = stack.stripe.intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].amount, 7099);
    assert_eq!(intents[0].currency, "usd");

    let confirmations = stack.stripe.confirmations();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].intent_id, summary.intent_id);
    assert_eq!(confirmations[0].billing_name, "Ana López");
    assert_eq!(confirmations[0].authorization, PUBLISHABLE_KEY);

    let receipt =
        std::fs::read_to_string(client.receipts.path().join(RECEIPT_FILE_NAME)).unwrap();
    assert_eq!(receipt.matches("<item>").count(), 3);
    assert!(receipt.contains("<nombre>Jarra &lt;grande&gt;</nombre>"));
    assert!(receipt.contains("<total>70.99</total>"));
    assert!(receipt.contains("<impuestos>11.36</impuestos>"));

    assert!(client.cart.is_empty());
    assert!(!client.gateway.is_processing());
}

#[tokio::test]
async fn test_declined_card_keeps_cart() {
    let stack = TestStack::start().await.unwrap();
    let client = client(&stack);
    fill_cart(&stack, &client.cart, &[2]).await;

    let err = client
        .gateway
        .pay(&card(DECLINED_CARD), "Ana López")
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Payment(_)));
    assert_eq!(err.to_string(), "Your card was declined.");
    assert_eq!(client.cart.len(), 1);
    assert!(!client.receipts.path().join(RECEIPT_FILE_NAME).exists());
    assert!(!client.gateway.is_processing());
}

#[tokio::test]
async fn test_missing_secret_key_reaches_client_verbatim() {
    let stack = TestStack::start_with(tienda_integration_tests::sample_catalog(), false)
        .await
        .unwrap();
    let client = client(&stack);
    fill_cart(&stack, &client.cart, &[1]).await;

    let err = client
        .gateway
        .pay(&card(VALID_CARD), "Ana López")
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Gateway(_)));
    assert_eq!(err.to_string(), "Stripe secret key not configured.");
    assert!(stack.stripe.confirmations().is_empty());
    assert_eq!(client.cart.len(), 1);
}

#[tokio::test]
async fn test_processor_rejection_reaches_client_verbatim() {
    let cheap = vec![tienda_integration_tests::catalog_row(
        9,
        "Chicle",
        Decimal::new(25, 2),
        None,
    )];
    let stack = TestStack::start_with(cheap, true).await.unwrap();
    let client = client(&stack);
    fill_cart(&stack, &client.cart, &[9]).await;

    let err = client
        .gateway
        .pay(&card(VALID_CARD), "Ana López")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Amount must be at least $0.50 usd");
    assert!(stack.stripe.intents().is_empty());
}

// =============================================================================
// Payment intent endpoint
// =============================================================================

#[tokio::test]
async fn test_tampered_amount_never_reaches_processor() {
    let stack = TestStack::start().await.unwrap();

    let response = reqwest::Client::new()
        .post(stack.storefront("/api/payment-intents"))
        .json(&json!({"amount": 100, "currency": "usd", "items": [2]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Amount does not match catalog prices."}));
    assert!(stack.stripe.intents().is_empty());
}

#[tokio::test]
async fn test_currency_is_lowercased() {
    let stack = TestStack::start().await.unwrap();

    let response = reqwest::Client::new()
        .post(stack.storefront("/api/payment-intents"))
        .json(&json!({"amount": 3000, "currency": "USD", "items": [2]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["clientSecret"], "pi_test1_secret_fake");
    assert_eq!(stack.stripe.intents()[0].currency, "usd");
}

#[tokio::test]
async fn test_cors_and_request_id_headers() {
    let stack = TestStack::start().await.unwrap();

    let response = reqwest::Client::new()
        .get(stack.storefront("/api/products"))
        .header("origin", "https://tienda.example")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_health() {
    let stack = TestStack::start().await.unwrap();

    let live = reqwest::get(stack.storefront("/health")).await.unwrap();
    assert_eq!(live.status(), 200);
    assert_eq!(live.text().await.unwrap(), "ok");

    let ready = reqwest::get(stack.storefront("/health/ready")).await.unwrap();
    assert_eq!(ready.status(), 200);
}
