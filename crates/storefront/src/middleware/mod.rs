//! HTTP middleware for the storefront.
//!
//! - Request ID: unique identifier per request for tracing and correlation
//! - CORS: any origin may call the JSON API

pub mod cors;
pub mod request_id;

pub use cors::cors_layer;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
