//! Integration test harness for Tienda.
//!
//! Runs the storefront router on an ephemeral port with an in-memory catalog,
//! next to a fake Stripe REST API that speaks the same form-encoded protocol.
//! No database or network access beyond loopback is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tienda-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use tienda_core::{CatalogRow, CurrencyCode, ProductId};
use tienda_storefront::catalog::InMemoryCatalog;
use tienda_storefront::config::{StorefrontConfig, StripeConfig};
use tienda_storefront::state::AppState;
use tienda_storefront::stripe::{PaymentProcessor, StripeClient};

/// Card number the fake processor declines.
pub const DECLINED_CARD: &str = "4000000000000002";

/// Card number the fake processor accepts.
pub const VALID_CARD: &str = "4242424242424242";

/// Publishable key used by test clients.
pub const PUBLISHABLE_KEY: &str = "pk_test_51TiendaPublishable";

const SECRET_KEY: &str = "sk_test_51TiendaSecretKey9xQ";

/// A payment intent created on the fake processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// A confirmation request received by the fake processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmCall {
    pub intent_id: String,
    pub billing_name: String,
    pub authorization: String,
}

/// In-memory stand-in for the Stripe payment intents API.
#[derive(Debug, Default)]
pub struct FakeStripe {
    intents: Mutex<Vec<CreatedIntent>>,
    confirmations: Mutex<Vec<ConfirmCall>>,
}

impl FakeStripe {
    #[must_use]
    pub fn intents(&self) -> Vec<CreatedIntent> {
        self.intents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn confirmations(&self) -> Vec<ConfirmCall> {
        self.confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/v1/payment_intents", post(create_intent))
            .route("/v1/payment_intents/{id}/confirm", post(confirm_intent))
            .with_state(Arc::clone(self))
    }
}

fn stripe_error(status: StatusCode, message: &str, kind: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"error": {"message": message, "type": kind}})))
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string()
}

async fn create_intent(
    State(stripe): State<Arc<FakeStripe>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !bearer(&headers).starts_with("sk_") {
        return stripe_error(
            StatusCode::UNAUTHORIZED,
            "Invalid API Key provided.",
            "invalid_request_error",
        );
    }

    let amount = form
        .get("amount")
        .and_then(|a| a.parse::<i64>().ok())
        .unwrap_or_default();
    let currency = form.get("currency").cloned().unwrap_or_default();
    if amount < 50 {
        return stripe_error(
            StatusCode::BAD_REQUEST,
            &format!("Amount must be at least $0.50 {currency}"),
            "invalid_request_error",
        );
    }

    let mut intents = stripe
        .intents
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let id = format!("pi_test{}", intents.len() + 1);
    intents.push(CreatedIntent {
        id: id.clone(),
        amount,
        currency: currency.clone(),
    });

    (
        StatusCode::OK,
        Json(json!({
            "id": id,
            "object": "payment_intent",
            "client_secret": format!("{id}_secret_fake"),
            "status": "requires_payment_method",
            "amount": amount,
            "currency": currency,
        })),
    )
}

async fn confirm_intent(
    State(stripe): State<Arc<FakeStripe>>,
    Path(intent_id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let authorization = bearer(&headers);
    let client_secret = form.get("client_secret").cloned().unwrap_or_default();
    if !authorization.starts_with("pk_") || !client_secret.starts_with(&format!("{intent_id}_secret_")) {
        return stripe_error(
            StatusCode::UNAUTHORIZED,
            "No such payment_intent.",
            "invalid_request_error",
        );
    }

    stripe
        .confirmations
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(ConfirmCall {
            intent_id: intent_id.clone(),
            billing_name: form
                .get("payment_method_data[billing_details][name]")
                .cloned()
                .unwrap_or_default(),
            authorization,
        });

    if form.get("payment_method_data[card][number]").map(String::as_str) == Some(DECLINED_CARD) {
        return stripe_error(
            StatusCode::PAYMENT_REQUIRED,
            "Your card was declined.",
            "card_error",
        );
    }

    (
        StatusCode::OK,
        Json(json!({"id": intent_id, "object": "payment_intent", "status": "succeeded"})),
    )
}

/// A catalog row fixture.
#[must_use]
pub fn catalog_row(id: i32, name: &str, price: Decimal, image: Option<&str>) -> CatalogRow {
    CatalogRow {
        productoid: ProductId::new(id),
        nombreproducto: name.to_string(),
        descripcion: None,
        precio: price,
        materiales: None,
        peso: None,
        altura: None,
        ancho: None,
        profundidad: None,
        nombrecategoria: Some("Cocina".to_string()),
        nombremarca: Some("Barro Vivo".to_string()),
        urlimagen: image.map(str::to_string),
    }
}

/// Three products; the first has two images and the last has none.
#[must_use]
pub fn sample_catalog() -> Vec<CatalogRow> {
    vec![
        catalog_row(1, "Taza de barro", Decimal::new(1250, 2), Some("/img/taza-1.jpg")),
        catalog_row(1, "Taza de barro", Decimal::new(1250, 2), Some("/img/taza-2.jpg")),
        catalog_row(2, "Plato hondo", Decimal::new(3000, 2), Some("/img/plato.jpg")),
        catalog_row(3, "Jarra <grande>", Decimal::new(4599, 2), None),
    ]
}

/// A storefront and fake processor listening on loopback.
pub struct TestStack {
    pub storefront_url: Url,
    pub stripe_url: Url,
    pub stripe: Arc<FakeStripe>,
}

impl TestStack {
    /// Start both servers with the sample catalog and a configured secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if a listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(sample_catalog(), true).await
    }

    /// Start both servers. Without `with_secret_key` the storefront has no
    /// payment processor configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a listener cannot be bound.
    pub async fn start_with(catalog: Vec<CatalogRow>, with_secret_key: bool) -> std::io::Result<Self> {
        let stripe = Arc::new(FakeStripe::default());
        let stripe_url = serve(stripe.router()).await?;

        let secret_key = with_secret_key.then(|| SecretString::from(SECRET_KEY));
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://unused@localhost/tienda"),
            host: [127, 0, 0, 1].into(),
            port: 0,
            currency: CurrencyCode::USD,
            stripe: StripeConfig {
                secret_key: secret_key.clone(),
                publishable_key: Some(PUBLISHABLE_KEY.to_string()),
                api_base: stripe_url.clone(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };
        let payments = secret_key.map(|key| {
            Arc::new(StripeClient::new(stripe_url.clone(), key)) as Arc<dyn PaymentProcessor>
        });
        let state = AppState::from_parts(config, Arc::new(InMemoryCatalog::new(catalog)), payments);
        let storefront_url = serve(tienda_storefront::app(state)).await?;

        Ok(Self {
            storefront_url,
            stripe_url,
            stripe,
        })
    }

    /// Absolute URL of a storefront path.
    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url.as_str().trim_end_matches('/'))
    }
}

/// Serve `router` on an ephemeral loopback port and return its base URL.
async fn serve(router: Router) -> std::io::Result<Url> {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, router).await });
    Url::parse(&format!("http://{addr}"))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
}
