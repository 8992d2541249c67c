//! Per-visitor page state.
//!
//! Each visitor (identified by an id kept in their session) gets one
//! [`Shopper`]: their reactive cart and the checkout page they have mounted,
//! if any. Shoppers live in a `moka` cache and are dropped after a week
//! without activity, matching the session expiry.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::cart::CartStore;
use crate::checkout::{CheckoutController, CheckoutOptions};

/// How long an idle visitor's state is kept.
pub const SHOPPER_IDLE_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const MAX_SHOPPERS: u64 = 100_000;

/// One visitor's cart and checkout page.
#[derive(Debug, Default)]
pub struct Shopper {
    cart: CartStore,
    checkout: Mutex<Option<Arc<CheckoutController>>>,
}

impl Shopper {
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// The currently mounted checkout page.
    #[must_use]
    pub fn checkout(&self) -> Option<Arc<CheckoutController>> {
        self.checkout.lock().clone()
    }

    /// Mount a fresh checkout page, replacing any earlier one.
    ///
    /// A redirect scheduled by the replaced page still fires.
    pub fn mount_checkout(&self, options: CheckoutOptions) -> Arc<CheckoutController> {
        let controller = Arc::new(CheckoutController::new(self.cart.clone(), options));
        *self.checkout.lock() = Some(Arc::clone(&controller));
        controller
    }
}

/// All active visitors.
#[derive(Clone)]
pub struct ShopperRegistry {
    shoppers: Cache<Uuid, Arc<Shopper>>,
}

impl Default for ShopperRegistry {
    fn default() -> Self {
        Self::new(SHOPPER_IDLE_TIMEOUT)
    }
}

impl ShopperRegistry {
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            shoppers: Cache::builder()
                .max_capacity(MAX_SHOPPERS)
                .time_to_idle(idle_timeout)
                .build(),
        }
    }

    /// Get a visitor's state, creating it on first sight.
    pub async fn get(&self, visitor: Uuid) -> Arc<Shopper> {
        self.shoppers
            .get_with(visitor, async { Arc::new(Shopper::default()) })
            .await
    }
}
