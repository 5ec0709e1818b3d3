//! JSON bodies exchanged with the payment-intent endpoint and the processor.

use serde::{Deserialize, Serialize};

use super::{CurrencyCode, ProductId};

/// Body of `POST /api/payment-intents`.
///
/// `items` lists the product id of every cart entry (repeated ids count once
/// per entry) so the backend can recompute the amount from catalog prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: CurrencyCode,
    pub items: Vec<ProductId>,
}

/// Successful response of `POST /api/payment-intents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

/// Error body returned by every storefront API endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Response of `GET /api/config`: values a client may know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub stripe_publishable_key: Option<String>,
    pub currency: CurrencyCode,
}

/// Error envelope of the Stripe REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

/// Error object inside [`StripeErrorBody`].
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_intent_request_wire_format() {
        let request = CreateIntentRequest {
            amount: 2599,
            currency: CurrencyCode::USD,
            items: vec![ProductId::new(4), ProductId::new(4)],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"amount": 2599, "currency": "usd", "items": [4, 4]})
        );
    }

    #[test]
    fn test_create_intent_response_uses_client_secret_key() {
        let response: CreateIntentResponse =
            serde_json::from_str(r#"{"clientSecret":"pi_1_secret_2"}"#).unwrap();
        assert_eq!(response.client_secret, "pi_1_secret_2");
    }

    #[test]
    fn test_stripe_error_body_parses_message() {
        let body: StripeErrorBody = serde_json::from_str(
            r#"{"error":{"message":"Your card was declined.","code":"card_declined","type":"card_error"}}"#,
        )
        .unwrap();
        assert_eq!(body.error.message.as_deref(), Some("Your card was declined."));
        assert_eq!(body.error.kind.as_deref(), Some("card_error"));
    }
}
