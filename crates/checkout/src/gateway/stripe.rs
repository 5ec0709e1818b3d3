//! Client-side payment confirmation against the Stripe REST API.
//!
//! Authenticates with the publishable key and the intent's client secret,
//! the same credentials a browser integration uses. Card details travel only
//! to Stripe.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use tienda_core::StripeErrorBody;

use super::CardProcessor;
use crate::error::CheckoutError;

/// Shown when Stripe fails without a readable error message.
const PAYMENT_FALLBACK_MESSAGE: &str = "Payment failed.";

/// Card data entered by the payer.
///
/// Implements `Debug` manually to redact the number and CVC.
#[derive(Clone)]
pub struct CardDetails {
    number: SecretString,
    exp_month: u8,
    exp_year: u16,
    cvc: SecretString,
}

impl CardDetails {
    #[must_use]
    pub fn new(number: impl Into<String>, exp_month: u8, exp_year: u16, cvc: impl Into<String>) -> Self {
        let number: String = number.into();
        Self {
            number: SecretString::from(number.replace([' ', '-'], "")),
            exp_month,
            exp_year,
            cvc: SecretString::from(cvc.into()),
        }
    }

    /// Last four digits of the card number.
    #[must_use]
    pub fn last4(&self) -> String {
        let digits = self.number.expose_secret();
        let start = digits.len().saturating_sub(4);
        digits.get(start..).unwrap_or_default().to_string()
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &format_args!("**** {}", self.last4()))
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

/// Result of a confirmation call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Confirmation {
    pub id: String,
    pub status: String,
}

/// Confirms payment intents with the publishable key.
#[derive(Clone)]
pub struct StripeConfirmClient {
    client: reqwest::Client,
    api_base: Url,
    publishable_key: String,
}

impl StripeConfirmClient {
    #[must_use]
    pub fn new(api_base: Url, publishable_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            publishable_key: publishable_key.into(),
        }
    }

    fn confirm_endpoint(&self, intent_id: &str) -> String {
        format!(
            "{}/v1/payment_intents/{intent_id}/confirm",
            self.api_base.as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CardProcessor for StripeConfirmClient {
    #[instrument(skip(self, client_secret, card, billing_name), fields(last4 = %card.last4()))]
    async fn confirm(
        &self,
        client_secret: &str,
        card: &CardDetails,
        billing_name: &str,
    ) -> Result<Confirmation, CheckoutError> {
        let intent_id = intent_id(client_secret)
            .ok_or_else(|| CheckoutError::Parse("malformed client secret".to_string()))?;

        let form = [
            ("client_secret", client_secret.to_string()),
            ("payment_method_data[type]", "card".to_string()),
            (
                "payment_method_data[card][number]",
                card.number.expose_secret().to_string(),
            ),
            (
                "payment_method_data[card][exp_month]",
                card.exp_month.to_string(),
            ),
            ("payment_method_data[card][exp_year]", card.exp_year.to_string()),
            (
                "payment_method_data[card][cvc]",
                card.cvc.expose_secret().to_string(),
            ),
            (
                "payment_method_data[billing_details][name]",
                billing_name.to_string(),
            ),
        ];

        let response = self
            .client
            .post(self.confirm_endpoint(intent_id))
            .bearer_auth(&self.publishable_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = payment_error_message(&body);
            tracing::warn!(status = %status, message = %message, "Payment confirmation failed");
            return Err(CheckoutError::Payment(message));
        }

        serde_json::from_str(&body).map_err(|e| CheckoutError::Parse(e.to_string()))
    }
}

/// Payment intent id encoded in a client secret (`pi_..._secret_...`).
fn intent_id(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
}

/// Stripe's error message, or a generic one.
fn payment_error_message(body: &str) -> String {
    serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.message)
        .unwrap_or_else(|| PAYMENT_FALLBACK_MESSAGE.to_string())
}
