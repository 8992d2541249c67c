//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::api::{ApiError, StoreClient};
use crate::checkout::CheckoutOptions;
use crate::config::StorefrontConfig;
use crate::shopper::ShopperRegistry;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the session database, the store API client and
/// the per-visitor page state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    store: StoreClient,
    shoppers: ShopperRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool (session store)
    ///
    /// # Errors
    ///
    /// Returns an error if the store API client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, ApiError> {
        let store = StoreClient::new(&config.store_api)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
                shoppers: ShopperRegistry::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the store API client.
    #[must_use]
    pub fn store(&self) -> &StoreClient {
        &self.inner.store
    }

    /// Get a reference to the per-visitor state registry.
    #[must_use]
    pub fn shoppers(&self) -> &ShopperRegistry {
        &self.inner.shoppers
    }

    /// Options for a newly mounted checkout page.
    #[must_use]
    pub fn checkout_options(&self, return_to: Option<String>) -> CheckoutOptions {
        CheckoutOptions {
            redirect_delay: self.inner.config.checkout.redirect_delay,
            return_to,
        }
    }
}
