//! Payment intent creation through the storefront backend.

use async_trait::async_trait;
use tracing::instrument;
use url::Url;

use tienda_core::{CreateIntentRequest, CreateIntentResponse, ErrorBody};

use super::IntentBackend;
use crate::error::CheckoutError;

/// Shown when the backend fails without a readable error body.
const INTENT_FALLBACK_MESSAGE: &str = "Error creating the payment intent.";

/// Calls `POST /api/payment-intents` on the storefront backend.
#[derive(Debug, Clone)]
pub struct HttpIntentBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpIntentBackend {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub const fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/api/payment-intents",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl IntentBackend for HttpIntentBackend {
    #[instrument(skip(self, request), fields(amount = request.amount, items = request.items.len()))]
    async fn create_intent(&self, request: &CreateIntentRequest) -> Result<String, CheckoutError> {
        let response = self.client.post(self.endpoint()).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            let message = backend_error_message(&body);
            tracing::warn!(status = %status, message = %message, "Backend refused payment intent");
            return Err(CheckoutError::Gateway(message));
        }

        serde_json::from_str::<CreateIntentResponse>(&body)
            .map(|parsed| parsed.client_secret)
            .map_err(|e| CheckoutError::Parse(e.to_string()))
    }
}

/// The backend's `error` field, or a generic message.
fn backend_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|parsed| parsed.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| INTENT_FALLBACK_MESSAGE.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_message_verbatim() {
        assert_eq!(
            backend_error_message(r#"{"error":"Stripe secret key not configured."}"#),
            "Stripe secret key not configured."
        );
    }

    #[test]
    fn test_backend_error_message_fallback() {
        assert_eq!(backend_error_message("Bad Gateway"), INTENT_FALLBACK_MESSAGE);
        assert_eq!(backend_error_message(r#"{"error":""}"#), INTENT_FALLBACK_MESSAGE);
    }

    #[test]
    fn test_endpoint() {
        let backend = HttpIntentBackend::new(Url::parse("http://localhost:3000").unwrap());
        assert_eq!(backend.endpoint(), "http://localhost:3000/api/payment-intents");
    }
}
