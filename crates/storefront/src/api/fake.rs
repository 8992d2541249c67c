//! In-process [`StoreApi`] for unit tests.
//!
//! Every endpoint waits on its own semaphore before answering, so tests can
//! hold a request open and release requests in any order.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use smile_cart_core::{
    Country, CountryCode, MinorUnits, Order, OrderId, OrderPayload, Product, ProductSlug,
};
use tokio::sync::Semaphore;

use super::{ApiError, StoreApi};

pub struct FakeStore {
    pub catalogue: Vec<Product>,
    pub country_list: Vec<Country>,
    pub fail_catalogue: AtomicBool,
    pub fail_orders: AtomicBool,
    pub orders: Mutex<Vec<OrderPayload>>,
    pub products_gate: Arc<Semaphore>,
    pub countries_gate: Arc<Semaphore>,
    pub orders_gate: Arc<Semaphore>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self {
            catalogue: vec![
                product("infinity-kettle", 1000, 800, &[]),
                product("tea-set", 999, 333, &["tea-side.png", "tea-top.png"]),
            ],
            country_list: vec![Country {
                code: CountryCode::new("US"),
                name: "United States".to_string(),
            }],
            fail_catalogue: AtomicBool::new(false),
            fail_orders: AtomicBool::new(false),
            orders: Mutex::new(Vec::new()),
            products_gate: open_gate(),
            countries_gate: open_gate(),
            orders_gate: open_gate(),
        }
    }
}

fn open_gate() -> Arc<Semaphore> {
    Arc::new(Semaphore::new(Semaphore::MAX_PERMITS))
}

pub fn product(slug: &str, mrp: u64, offer_price: u64, extra_images: &[&str]) -> Product {
    Product {
        slug: ProductSlug::new(slug),
        name: slug.replace('-', " "),
        description: format!("All about {slug}"),
        mrp: MinorUnits::new(mrp),
        offer_price: MinorUnits::new(offer_price),
        available_quantity: 5,
        image_url: format!("{slug}.png"),
        image_urls: if extra_images.is_empty() {
            None
        } else {
            Some(extra_images.iter().map(ToString::to_string).collect())
        },
    }
}

impl FakeStore {
    /// A store whose product and country requests block until released.
    pub fn gated() -> Self {
        Self {
            products_gate: Arc::new(Semaphore::new(0)),
            countries_gate: Arc::new(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().len()
    }

    fn lookup(&self, slug: &ProductSlug) -> Result<Product, ApiError> {
        self.catalogue
            .iter()
            .find(|p| &p.slug == slug)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("products/{slug}")))
    }
}

impl StoreApi for FakeStore {
    async fn product(&self, slug: &ProductSlug) -> Result<Product, ApiError> {
        let _permit = self.products_gate.acquire().await.unwrap();
        self.lookup(slug)
    }

    async fn products(&self, slugs: &[ProductSlug]) -> Result<Vec<Product>, ApiError> {
        let _permit = self.products_gate.acquire().await.unwrap();
        if self.fail_catalogue.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self
            .catalogue
            .iter()
            .filter(|p| slugs.contains(&p.slug))
            .cloned()
            .collect())
    }

    async fn all_products(&self) -> Result<Vec<Product>, ApiError> {
        let _permit = self.products_gate.acquire().await.unwrap();
        Ok(self.catalogue.clone())
    }

    async fn countries(&self) -> Result<Vec<Country>, ApiError> {
        let _permit = self.countries_gate.acquire().await.unwrap();
        Ok(self.country_list.clone())
    }

    async fn create_order(&self, payload: &OrderPayload) -> Result<Order, ApiError> {
        let _permit = self.orders_gate.acquire().await.unwrap();
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected("kettle is out of stock".to_string()));
        }
        let mut orders = self.orders.lock();
        orders.push(payload.clone());
        Ok(Order {
            id: OrderId::new(format!("order-{}", orders.len())),
            status: Some("received".to_string()),
        })
    }
}
