//! Request wrappers with a single discriminated state per fetch.
//!
//! Each read request resolves to a [`RemoteData`], so a page never sees
//! "loading and failed at once". Order creation is a mutation: it returns a
//! plain `Result` and the caller branches on success or failure.

use std::sync::Arc;

use smile_cart_core::{Country, Order, OrderPayload, Product, ProductSlug};

use crate::api::{ApiError, StoreApi};

/// State of one remote read.
#[derive(Debug, Clone)]
pub enum RemoteData<T> {
    Loading,
    Success(T),
    Failure(Arc<ApiError>),
}

impl<T> RemoteData<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Loading | Self::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failure(error) => Some(error),
            Self::Loading | Self::Success(_) => None,
        }
    }
}

impl<T> From<Result<T, ApiError>> for RemoteData<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(error) => Self::Failure(Arc::new(error)),
        }
    }
}

/// Fetch full records for the cart keys as they are right now.
pub async fn fetch_cart_products<A: StoreApi>(
    api: &A,
    keys: &[ProductSlug],
) -> RemoteData<Vec<Product>> {
    let result = api.products(keys).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, count = keys.len(), "Failed to fetch cart products");
    }
    result.into()
}

/// Fetch every product for the home page.
pub async fn fetch_catalogue<A: StoreApi>(api: &A) -> RemoteData<Vec<Product>> {
    let result = api.all_products().await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Failed to fetch catalogue");
    }
    result.into()
}

/// Fetch the country list for the address form.
pub async fn fetch_countries<A: StoreApi>(api: &A) -> RemoteData<Vec<Country>> {
    let result = api.countries().await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Failed to fetch countries");
    }
    result.into()
}

/// Fetch a single product for its detail page.
pub async fn fetch_product<A: StoreApi>(api: &A, slug: &ProductSlug) -> RemoteData<Product> {
    api.product(slug).await.into()
}

/// Create an order. No retry on failure.
///
/// # Errors
///
/// Returns the API error unchanged so the caller can surface it.
pub async fn create_order<A: StoreApi>(api: &A, payload: &OrderPayload) -> Result<Order, ApiError> {
    api.create_order(payload).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_exclusive() {
        let loading: RemoteData<u8> = RemoteData::Loading;
        assert!(loading.is_loading() && !loading.is_error() && loading.data().is_none());

        let success: RemoteData<u8> = Ok(7).into();
        assert!(!success.is_loading() && !success.is_error());
        assert_eq!(success.data(), Some(&7));

        let failure: RemoteData<u8> = Err(ApiError::NotFound("x".to_string())).into();
        assert!(failure.is_error() && !failure.is_loading() && failure.data().is_none());
        assert!(failure.error().is_some_and(ApiError::is_not_found));
    }
}
