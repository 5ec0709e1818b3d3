//! Core types for Tienda.
//!
//! This module provides type-safe wrappers for common domain concepts and the
//! JSON shapes exchanged between the storefront backend and its clients.

pub mod id;
pub mod payment;
pub mod price;
pub mod product;

pub use id::*;
pub use payment::{
    CreateIntentRequest, CreateIntentResponse, ErrorBody, PublicConfig, StripeErrorBody,
    StripeErrorDetail,
};
pub use price::{CurrencyCode, CurrencyError, MoneyError, Price};
pub use product::{CatalogRow, Product, products_from_rows};
