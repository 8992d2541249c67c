//! Store REST API access.
//!
//! # Endpoints
//!
//! ```text
//! GET  /products/{slug}        -> Product
//! GET  /products?ids=a,b       -> [Product]
//! GET  /products               -> [Product]
//! GET  /countries              -> [Country]
//! POST /orders (OrderPayload)  -> Order | {"error": "..."}
//! ```
//!
//! Handlers and page controllers depend on the [`StoreApi`] trait so tests can
//! substitute an in-process fake. [`StoreClient`] is the `reqwest`
//! implementation; it caches products and countries with `moka`.

mod cache;
mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::StoreClient;

use std::future::Future;

use smile_cart_core::{Country, Order, OrderPayload, Product, ProductError, ProductSlug};
use thiserror::Error;

/// Errors that can occur when talking to the store API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The API refused an order (validation or stock problem).
    #[error("Order rejected: {0}")]
    Rejected(String),

    /// Any other non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The API returned a product that breaks catalogue invariants.
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductError),

    /// The configured base URL cannot carry path segments.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the error means the requested record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Operations the storefront needs from the store API.
pub trait StoreApi: Send + Sync {
    /// Fetch one product by slug.
    fn product(&self, slug: &ProductSlug) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Fetch the products for a set of slugs.
    fn products(
        &self,
        slugs: &[ProductSlug],
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Fetch the full catalogue.
    fn all_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Fetch the country list for the address form.
    fn countries(&self) -> impl Future<Output = Result<Vec<Country>, ApiError>> + Send;

    /// Create an order. Never retried.
    fn create_order(
        &self,
        payload: &OrderPayload,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("products/kettle".to_string());
        assert_eq!(err.to_string(), "Not found: products/kettle");
        assert!(err.is_not_found());

        let err = ApiError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status 502: bad gateway");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
