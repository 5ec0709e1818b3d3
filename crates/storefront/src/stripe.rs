//! Stripe REST client for server-side payment intent creation.
//!
//! Only the secret-key half of the flow lives here: creating a payment intent
//! and returning its client secret. Card details never reach this server; the
//! client confirms the intent directly with Stripe.
//!
//! Requests are form-encoded, as the Stripe API expects. Error responses carry
//! `{"error": {"message": ...}}`; the message is surfaced verbatim.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use tienda_core::{CurrencyCode, StripeErrorBody};

use crate::config::StripeConfig;

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe rejected the request. Displays the processor's message as-is.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Response body could not be understood.
    #[error("Unexpected Stripe response: {0}")]
    Parse(String),
}

/// The fields of a Stripe payment intent this server cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
}

/// Creates payment intents with server-held credentials.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a card payment intent for `amount` minor units.
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: CurrencyCode,
    ) -> Result<PaymentIntent, StripeError>;
}

/// Stripe API client authenticated with the secret key.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_base: Url,
    secret_key: SecretString,
}

impl StripeClient {
    /// Create a client from configuration.
    ///
    /// Returns `None` when no secret key is configured.
    #[must_use]
    pub fn from_config(config: &StripeConfig) -> Option<Self> {
        config
            .secret_key
            .clone()
            .map(|secret_key| Self::new(config.api_base.clone(), secret_key))
    }

    /// Create a client for the given API base URL.
    #[must_use]
    pub fn new(api_base: Url, secret_key: SecretString) -> Self {
        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                api_base,
                secret_key,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    #[instrument(skip(self))]
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: CurrencyCode,
    ) -> Result<PaymentIntent, StripeError> {
        let form = [
            ("amount", amount.to_string()),
            ("currency", currency.code().to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .inner
            .client
            .post(self.endpoint("/v1/payment_intents"))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = api_error_message(&body);
            tracing::warn!(status = %status, message = %message, "Stripe rejected payment intent");
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Stripe payment intent"
            );
            StripeError::Parse(e.to_string())
        })
    }
}

/// Extract the human-readable message from a Stripe error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.message)
        .unwrap_or_else(|| format!("Stripe error: {}", body.chars().take(200).collect::<String>()))
}
