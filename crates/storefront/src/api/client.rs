//! `reqwest` implementation of [`StoreApi`].
//!
//! Products and countries are cached with `moka` (TTL from configuration).
//! Order creation always goes to the network.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use smile_cart_core::{Country, Order, OrderPayload, Product, ProductSlug};
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, StoreApi};
use crate::config::StoreApiConfig;

/// Longest response body excerpt kept in errors and logs.
const BODY_EXCERPT_CHARS: usize = 300;

/// Client for the store REST API.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

/// Error body returned by the API for rejected requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl StoreClient {
    /// Create a new store API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StoreApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(StoreClientInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                cache,
            }),
        })
    }

    /// Build an endpoint URL below the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .header("Accept", "application/json");

        match &self.inner.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body, mapping error statuses.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(resource.to_string()));
        }

        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::BAD_REQUEST {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map_or_else(|_| excerpt(&body), |e| e.error);
            return Err(ApiError::Rejected(message));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %excerpt(&body),
                resource,
                "Store API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                resource,
                "Failed to parse store API response"
            );
            ApiError::Parse(e)
        })
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.inner.cache.get(key).await;
        if value.is_some() {
            debug!(?key, "Cache hit");
        }
        value
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

fn validate_all(products: &[Product]) -> Result<(), ApiError> {
    for product in products {
        product.validate()?;
    }
    Ok(())
}

impl StoreApi for StoreClient {
    #[instrument(skip(self), fields(slug = %slug))]
    async fn product(&self, slug: &ProductSlug) -> Result<Product, ApiError> {
        let key = CacheKey::Product(slug.clone());
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            return Ok(*product);
        }

        let url = self.endpoint(&["products", slug.as_str()])?;
        let product: Product = self
            .send(self.request(reqwest::Method::GET, url), &format!("products/{slug}"))
            .await?;
        product.validate()?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self), fields(count = slugs.len()))]
    async fn products(&self, slugs: &[ProductSlug]) -> Result<Vec<Product>, ApiError> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let key = CacheKey::products(slugs);
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            return Ok(products);
        }

        let mut url = self.endpoint(&["products"])?;
        url.query_pairs_mut().append_pair("ids", &key.ids_param());

        let products: Vec<Product> = self
            .send(self.request(reqwest::Method::GET, url), "products")
            .await?;
        validate_all(&products)?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn all_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cached(&CacheKey::Catalogue).await {
            return Ok(products);
        }

        let url = self.endpoint(&["products"])?;
        let products: Vec<Product> = self
            .send(self.request(reqwest::Method::GET, url), "products")
            .await?;
        validate_all(&products)?;

        self.inner
            .cache
            .insert(CacheKey::Catalogue, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn countries(&self) -> Result<Vec<Country>, ApiError> {
        if let Some(CacheValue::Countries(countries)) = self.cached(&CacheKey::Countries).await {
            return Ok(countries);
        }

        let url = self.endpoint(&["countries"])?;
        let countries: Vec<Country> = self
            .send(self.request(reqwest::Method::GET, url), "countries")
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Countries, CacheValue::Countries(countries.clone()))
            .await;

        Ok(countries)
    }

    #[instrument(skip(self, payload), fields(lines = payload.items.len()))]
    async fn create_order(&self, payload: &OrderPayload) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let order: Order = self
            .send(
                self.request(reqwest::Method::POST, url).json(payload),
                "orders",
            )
            .await?;

        tracing::info!(order_id = %order.id, "Order created");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::parse_base_url;

    fn client(base: &str) -> StoreClient {
        StoreClient::new(&StoreApiConfig {
            base_url: parse_base_url(base).unwrap(),
            token: None,
            timeout: Duration::from_secs(1),
            cache_ttl: Duration::from_secs(60),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("https://api.smile.test/v1");
        let url = client.endpoint(&["products", "kettle"]).unwrap();
        assert_eq!(url.as_str(), "https://api.smile.test/v1/products/kettle");
    }

    #[test]
    fn test_endpoint_escapes_slug() {
        let client = client("https://api.smile.test");
        let url = client.endpoint(&["products", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://api.smile.test/products/a%2Fb%20c");
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(BODY_EXCERPT_CHARS + 50);
        assert_eq!(excerpt(&long).len(), BODY_EXCERPT_CHARS);
    }
}
