//! Cache types for store API responses.

use smile_cart_core::{Country, Product, ProductSlug};

/// Cache key for products and countries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductSlug),
    /// Sorted, de-duplicated slug set.
    Products(Vec<ProductSlug>),
    Catalogue,
    Countries,
}

impl CacheKey {
    /// Key for a slug set, independent of input order.
    pub fn products(slugs: &[ProductSlug]) -> Self {
        let mut slugs = slugs.to_vec();
        slugs.sort();
        slugs.dedup();
        Self::Products(slugs)
    }

    /// Slugs covered by a [`CacheKey::Products`] key, comma-joined for the
    /// `ids` query parameter. Empty for other keys.
    pub fn ids_param(&self) -> String {
        match self {
            Self::Products(slugs) => slugs
                .iter()
                .map(ProductSlug::as_str)
                .collect::<Vec<_>>()
                .join(","),
            Self::Product(_) | Self::Catalogue | Self::Countries => String::new(),
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Countries(Vec<Country>),
}
