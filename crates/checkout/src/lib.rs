//! Tienda checkout client.
//!
//! Everything a checkout front end needs apart from rendering:
//!
//! - [`catalog`] - fetch products from the storefront backend
//! - [`cart`] - observable in-memory cart
//! - [`gateway`] - payment intent creation and card confirmation
//! - [`receipt`] - XML receipt generation
//!
//! Card details go straight to Stripe with the publishable key; the storefront
//! backend only ever sees product ids and the amount.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod receipt;

pub use cart::{Cart, CartStore};
pub use catalog::{CatalogClient, CatalogError};
pub use config::CheckoutConfig;
pub use error::CheckoutError;
pub use gateway::{
    CardDetails, CardProcessor, CheckoutSummary, HttpIntentBackend, IntentBackend,
    PaymentGateway, PaymentState, StripeConfirmClient,
};
pub use receipt::{DirectorySink, DownloadSink, ReceiptGenerator, ReceiptItem};
