//! Payment gateway: turns the cart into a confirmed payment.
//!
//! A payment runs through
//! `Idle -> CreatingIntent -> Confirming -> Succeeded | Failed`:
//!
//! 1. The storefront backend creates a payment intent ([`IntentBackend`]) and
//!    returns its client secret. It recomputes the amount from the submitted
//!    product ids.
//! 2. The card is confirmed directly with the processor ([`CardProcessor`]).
//! 3. On success the receipt is generated and the cart cleared.
//!
//! Only one payment may be in flight per gateway. The processing flag is
//! released on every exit path, including when the `pay` future is dropped.

mod backend;
mod stripe;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use tienda_core::{CreateIntentRequest, CurrencyCode, Price};

pub use backend::HttpIntentBackend;
pub use stripe::{CardDetails, Confirmation, StripeConfirmClient};

use crate::cart::CartStore;
use crate::error::CheckoutError;
use crate::receipt::{ReceiptGenerator, ReceiptItem};

/// Processor status of a completed payment.
const STATUS_SUCCEEDED: &str = "succeeded";

/// Creates payment intents with server-held credentials.
#[async_trait]
pub trait IntentBackend: Send + Sync {
    /// Create an intent and return its client secret.
    async fn create_intent(&self, request: &CreateIntentRequest) -> Result<String, CheckoutError>;
}

/// Confirms a payment intent with card details.
#[async_trait]
pub trait CardProcessor: Send + Sync {
    async fn confirm(
        &self,
        client_secret: &str,
        card: &CardDetails,
        billing_name: &str,
    ) -> Result<Confirmation, CheckoutError>;
}

/// Where the current payment stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaymentState {
    #[default]
    Idle,
    CreatingIntent,
    Confirming,
    Succeeded { intent_id: String },
    /// Message suitable for the payer.
    Failed(String),
}

/// Outcome of a successful payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub intent_id: String,
    pub status: String,
    pub item_count: usize,
    pub total: Decimal,
}

/// Holds the processing flag; releases it on drop.
///
/// A payment abandoned mid-flight leaves no in-flight state behind: the
/// state falls back to `Idle`.
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
    state: &'a watch::Sender<PaymentState>,
}

impl<'a> ProcessingGuard<'a> {
    fn acquire(
        flag: &'a AtomicBool,
        state: &'a watch::Sender<PaymentState>,
    ) -> Result<Self, CheckoutError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CheckoutError::AlreadyProcessing)?;
        Ok(Self { flag, state })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| {
            let in_flight = matches!(
                state,
                PaymentState::CreatingIntent | PaymentState::Confirming
            );
            if in_flight {
                *state = PaymentState::Idle;
            }
            in_flight
        });
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives a checkout for one cart.
pub struct PaymentGateway {
    cart: CartStore,
    backend: Arc<dyn IntentBackend>,
    processor: Arc<dyn CardProcessor>,
    receipts: ReceiptGenerator,
    currency: CurrencyCode,
    processing: AtomicBool,
    state: watch::Sender<PaymentState>,
}

impl PaymentGateway {
    #[must_use]
    pub fn new(
        cart: CartStore,
        backend: Arc<dyn IntentBackend>,
        processor: Arc<dyn CardProcessor>,
        receipts: ReceiptGenerator,
        currency: CurrencyCode,
    ) -> Self {
        let (state, _rx) = watch::channel(PaymentState::Idle);
        Self {
            cart,
            backend,
            processor,
            receipts,
            currency,
            processing: AtomicBool::new(false),
            state,
        }
    }

    /// Whether a payment is in flight.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Current payment state.
    #[must_use]
    pub fn state(&self) -> PaymentState {
        self.state.borrow().clone()
    }

    /// Subscribe to payment state changes; starts at the current state.
    #[must_use]
    pub fn observe(&self) -> watch::Receiver<PaymentState> {
        let mut rx = self.state.subscribe();
        rx.mark_changed();
        rx
    }

    /// Pay for the current cart contents.
    ///
    /// On success the receipt has been handed to the download sink and the
    /// cart is empty. On failure the cart is untouched.
    ///
    /// # Errors
    ///
    /// - `AlreadyProcessing` while another payment is in flight
    /// - `EmptyCart` without any network call
    /// - `Gateway` with the backend's message
    /// - `Payment` with the processor's message, or when the processor
    ///   reports any status other than `succeeded`
    #[instrument(skip(self, card, billing_name))]
    pub async fn pay(
        &self,
        card: &CardDetails,
        billing_name: &str,
    ) -> Result<CheckoutSummary, CheckoutError> {
        let _guard = ProcessingGuard::acquire(&self.processing, &self.state)?;

        let result = self.run(card, billing_name).await;
        match &result {
            Ok(summary) => {
                info!(intent_id = %summary.intent_id, total = %summary.total, "Payment succeeded");
                self.state.send_replace(PaymentState::Succeeded {
                    intent_id: summary.intent_id.clone(),
                });
            }
            Err(e) => {
                warn!(error = %e, "Payment failed");
                self.state.send_replace(PaymentState::Failed(e.to_string()));
            }
        }
        result
    }

    async fn run(
        &self,
        card: &CardDetails,
        billing_name: &str,
    ) -> Result<CheckoutSummary, CheckoutError> {
        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let total = cart.total();
        let request = CreateIntentRequest {
            amount: Price::new(total, self.currency).minor_units()?,
            currency: self.currency,
            items: cart.ids(),
        };

        self.state.send_replace(PaymentState::CreatingIntent);
        let client_secret = self.backend.create_intent(&request).await?;

        self.state.send_replace(PaymentState::Confirming);
        let confirmation = self
            .processor
            .confirm(&client_secret, card, billing_name)
            .await?;

        if confirmation.status != STATUS_SUCCEEDED {
            return Err(CheckoutError::Payment(format!(
                "Payment was not completed (status: {}).",
                confirmation.status
            )));
        }

        let items: Vec<ReceiptItem> = cart.items().iter().map(ReceiptItem::from).collect();
        self.receipts.generate(&items, total).await;
        self.cart.clear();

        Ok(CheckoutSummary {
            intent_id: confirmation.id,
            status: confirmation.status,
            item_count: items.len(),
            total,
        })
    }
}
