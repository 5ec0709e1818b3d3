//! Payment route handlers.
//!
//! The browser never sends card data here. This endpoint only creates the
//! payment intent with the server-held secret key and returns its client
//! secret; the client confirms the intent with Stripe directly.
//!
//! The amount is not trusted: it is recomputed from catalog prices of the
//! submitted product ids and must match what the client computed.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use tienda_core::{CreateIntentResponse, CurrencyCode, Price, ProductId, PublicConfig};

use crate::catalog::ProductCatalog;
use crate::error::{AppError, INVALID_PARAMETERS, MISSING_PARAMETERS, Result, add_breadcrumb};
use crate::state::AppState;

/// Payment intent request body.
///
/// Every field is optional so that absent fields produce the documented 400
/// instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateIntentParams {
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub items: Option<Vec<ProductId>>,
}

/// Publishable configuration for checkout clients.
pub async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(PublicConfig {
        stripe_publishable_key: state.config().stripe.publishable_key.clone(),
        currency: state.config().currency,
    })
}

/// Create a payment intent and return its client secret.
#[instrument(skip(state, payload))]
pub async fn create_intent(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateIntentParams>, JsonRejection>,
) -> Result<Json<CreateIntentResponse>> {
    let params = match payload {
        Ok(Json(params)) => params,
        Err(JsonRejection::JsonDataError(rejection)) => {
            tracing::debug!(error = %rejection.body_text(), "Malformed payment intent field");
            return Err(AppError::BadRequest(INVALID_PARAMETERS.to_string()));
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable payment intent request");
            return Err(AppError::BadRequest(MISSING_PARAMETERS.to_string()));
        }
    };

    let (Some(amount), Some(currency), Some(items)) = (params.amount, params.currency, params.items)
    else {
        return Err(AppError::BadRequest(MISSING_PARAMETERS.to_string()));
    };
    if items.is_empty() {
        return Err(AppError::BadRequest(MISSING_PARAMETERS.to_string()));
    }

    let currency = currency
        .to_lowercase()
        .parse::<CurrencyCode>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let processor = state.payments().ok_or(AppError::PaymentsNotConfigured)?;

    let expected = catalog_amount(state.catalog(), &items, currency).await?;
    if expected != amount {
        tracing::warn!(
            submitted = amount,
            expected,
            "Payment amount does not match catalog prices"
        );
        return Err(AppError::BadRequest(
            "Amount does not match catalog prices.".to_string(),
        ));
    }

    let intent = processor.create_payment_intent(expected, currency).await?;
    tracing::info!(intent_id = %intent.id, amount = expected, "Payment intent created");
    add_breadcrumb(
        "checkout",
        "Payment intent created",
        Some(&[("intent_id", intent.id.as_str())]),
    );

    let client_secret = intent.client_secret.ok_or_else(|| {
        AppError::Internal(format!("payment intent {} has no client secret", intent.id))
    })?;

    Ok(Json(CreateIntentResponse { client_secret }))
}

/// Sum of catalog prices for the given cart entries, in minor units.
async fn catalog_amount(
    catalog: &dyn ProductCatalog,
    items: &[ProductId],
    currency: CurrencyCode,
) -> Result<i64> {
    let prices = catalog.prices(items).await?;

    let mut total = Decimal::ZERO;
    for id in items {
        let price = prices
            .get(id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown product: {id}")))?;
        total += *price;
    }

    Price::new(total, currency)
        .minor_units()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}
