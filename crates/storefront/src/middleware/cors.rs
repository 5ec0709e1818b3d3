//! Cross-origin resource sharing for the JSON API.
//!
//! The checkout page and CLI may be served from any origin. Preflight
//! `OPTIONS` requests are answered by the layer itself with an empty 200.

use axum::http::{Method, header};
use tower_http::cors::{Any, CorsLayer};

/// CORS policy: any origin, `GET`/`POST`/`OPTIONS`, `Content-Type` and
/// `Authorization` request headers.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
