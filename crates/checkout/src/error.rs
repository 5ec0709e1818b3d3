//! Checkout error types.

use thiserror::Error;

use tienda_core::MoneyError;

/// Errors surfaced by [`PaymentGateway::pay`](crate::PaymentGateway::pay).
///
/// `Gateway` and `Payment` carry messages from the backend and the processor
/// unchanged; they are meant to be shown to the payer.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("The cart is empty.")]
    EmptyCart,

    #[error("A payment is already being processed.")]
    AlreadyProcessing,

    /// The storefront backend refused to create a payment intent.
    #[error("{0}")]
    Gateway(String),

    /// The processor declined or did not complete the payment.
    #[error("{0}")]
    Payment(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid amount: {0}")]
    Money(#[from] MoneyError),

    #[error("Unexpected response: {0}")]
    Parse(String),
}
