//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every error reaches the client as a JSON `{"error": "..."}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use tienda_core::ErrorBody;

use crate::db::RepositoryError;
use crate::stripe::StripeError;

/// Message returned when a payment intent request lacks required fields.
pub const MISSING_PARAMETERS: &str = "Missing required parameters.";

/// Message returned when a payment intent field has the wrong type.
pub const INVALID_PARAMETERS: &str = "Invalid request parameters.";

/// Message returned when payment intents are requested without a secret key.
pub const STRIPE_NOT_CONFIGURED: &str = "Stripe secret key not configured.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Stripe API operation failed.
    #[error("Stripe error: {0}")]
    Stripe(#[from] StripeError),

    /// Stripe secret key missing from the environment.
    #[error("Stripe secret key not configured.")]
    PaymentsNotConfigured,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Stripe(_) | Self::PaymentsNotConfigured
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_)
            | Self::Internal(_)
            | Self::Stripe(_)
            | Self::PaymentsNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients; processor messages
        // are meant for the payer and pass through unchanged.
        let message = match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Stripe(err) => err.to_string(),
            Self::PaymentsNotConfigured => STRIPE_NOT_CONFIGURED.to_string(),
            Self::BadRequest(message) => message,
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for checkout actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Payment intent created", Some(&[("amount", "2599")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn into_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");

        assert_eq!(
            AppError::PaymentsNotConfigured.to_string(),
            STRIPE_NOT_CONFIGURED
        );
    }

    #[tokio::test]
    async fn test_bad_request_body_is_bare_message() {
        let (status, body) = into_parts(AppError::BadRequest(MISSING_PARAMETERS.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, MISSING_PARAMETERS);
    }

    #[tokio::test]
    async fn test_stripe_error_passes_message_through() {
        let err = AppError::Stripe(StripeError::Api {
            status: 402,
            message: "Your card was declined.".to_string(),
        });
        let (status, body) = into_parts(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Your card was declined.");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, body) = into_parts(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
    }

    #[tokio::test]
    async fn test_missing_key_status() {
        let (status, body) = into_parts(AppError::PaymentsNotConfigured).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, STRIPE_NOT_CONFIGURED);
    }
}
