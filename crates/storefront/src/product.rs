//! Product detail page.
//!
//! [`ProductPage`] fetches one product and reduces the result to a
//! [`ProductPhase`]. A loaded product is turned into a [`ProductDisplay`]:
//! prices, an optional discount and the image gallery.

use smile_cart_core::{Discount, ImageGallery, MinorUnits, Product, ProductSlug};

use crate::api::{ApiError, StoreApi};
use crate::remote::{self, RemoteData};

/// What the product page shows.
#[derive(Debug, Clone)]
pub enum ProductPhase {
    Loading,
    Loaded(ProductDisplay),
    /// The fetch failed. The error has already been logged.
    Error(std::sync::Arc<ApiError>),
}

impl ProductPhase {
    /// Whether the failure means the product does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Error(e) if e.is_not_found())
    }
}

/// Render-ready view of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDisplay {
    pub slug: ProductSlug,
    pub name: String,
    pub description: String,
    pub mrp: MinorUnits,
    pub offer_price: MinorUnits,
    pub available_quantity: u32,
    /// Present only when the offer price is below the MRP.
    pub discount: Option<Discount>,
    pub gallery: ImageGallery,
}

impl From<Product> for ProductDisplay {
    fn from(product: Product) -> Self {
        let discount = product.discount().filter(|d| d.amount > MinorUnits::ZERO);
        let gallery = product.gallery();
        Self {
            slug: product.slug,
            name: product.name,
            description: product.description,
            mrp: product.mrp,
            offer_price: product.offer_price,
            available_quantity: product.available_quantity,
            discount,
            gallery,
        }
    }
}

impl ProductDisplay {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.available_quantity > 0
    }
}

/// Loader for a single product page.
#[derive(Debug, Clone)]
pub struct ProductPage {
    slug: ProductSlug,
}

impl ProductPage {
    #[must_use]
    pub const fn new(slug: ProductSlug) -> Self {
        Self { slug }
    }

    #[must_use]
    pub const fn slug(&self) -> &ProductSlug {
        &self.slug
    }

    /// Fetch the product and settle on a phase.
    pub async fn load<A: StoreApi>(&self, api: &A) -> ProductPhase {
        match remote::fetch_product(api, &self.slug).await {
            RemoteData::Success(product) => ProductPhase::Loaded(product.into()),
            RemoteData::Failure(error) => {
                if error.is_not_found() {
                    tracing::info!(slug = %self.slug, "Product not found");
                } else {
                    tracing::error!(slug = %self.slug, error = %error, "Failed to load product");
                }
                ProductPhase::Error(error)
            }
            RemoteData::Loading => ProductPhase::Loading,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeStore, product};

    #[tokio::test]
    async fn test_loaded_with_discount_and_single_image() {
        let store = FakeStore::default();
        let page = ProductPage::new(ProductSlug::new("infinity-kettle"));

        let ProductPhase::Loaded(display) = page.load(&store).await else {
            panic!("expected loaded product");
        };

        let discount = display.discount.unwrap();
        assert_eq!(discount.amount, MinorUnits::new(200));
        assert_eq!(discount.percentage_label(), "20.0");
        assert_eq!(
            display.gallery,
            ImageGallery::Single("infinity-kettle.png".to_string())
        );
        assert!(display.in_stock());
    }

    #[tokio::test]
    async fn test_carousel_lists_primary_first() {
        let store = FakeStore::default();
        let page = ProductPage::new(ProductSlug::new("tea-set"));

        let ProductPhase::Loaded(display) = page.load(&store).await else {
            panic!("expected loaded product");
        };

        assert!(display.gallery.is_carousel());
        assert_eq!(
            display.gallery.urls(),
            vec!["tea-set.png", "tea-side.png", "tea-top.png"]
        );
        assert_eq!(display.discount.unwrap().percentage_label(), "66.7");
    }

    #[tokio::test]
    async fn test_missing_product_is_error() {
        let store = FakeStore::default();
        let phase = ProductPage::new(ProductSlug::new("ghost")).load(&store).await;

        assert!(matches!(phase, ProductPhase::Error(_)));
        assert!(phase.is_not_found());
    }

    #[test]
    fn test_no_discount_at_full_price() {
        let display = ProductDisplay::from(product("mug", 500, 500, &[]));
        assert!(display.discount.is_none());
        assert_eq!(display.offer_price.to_string(), "$5.00");
    }
}
