//! Product catalogue records as served by the store API.

use serde::{Deserialize, Serialize};

use crate::types::{CountryCode, Discount, MinorUnits, ProductSlug};

/// Errors for product records that break catalogue invariants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// The offer price is higher than the maximum retail price.
    #[error("offer price {offer_price} exceeds mrp {mrp} for product {slug}")]
    OfferAboveMrp {
        slug: ProductSlug,
        mrp: MinorUnits,
        offer_price: MinorUnits,
    },
}

/// A product record.
///
/// Prices are in minor currency units. `image_urls` holds the images shown
/// after the primary `image_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub slug: ProductSlug,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub mrp: MinorUnits,
    pub offer_price: MinorUnits,
    pub available_quantity: u32,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
}

impl Product {
    /// Check the catalogue invariant `offer_price <= mrp`.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::OfferAboveMrp`] if the offer price is higher.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.offer_price > self.mrp {
            return Err(ProductError::OfferAboveMrp {
                slug: self.slug.clone(),
                mrp: self.mrp,
                offer_price: self.offer_price,
            });
        }
        Ok(())
    }

    /// Discount of the offer price against the mrp.
    #[must_use]
    pub fn discount(&self) -> Option<Discount> {
        Discount::between(self.mrp, self.offer_price)
    }

    /// How the product images should be presented.
    #[must_use]
    pub fn gallery(&self) -> ImageGallery {
        ImageGallery::new(&self.image_url, self.image_urls.as_deref().unwrap_or_default())
    }
}

/// Image presentation for a product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageGallery {
    /// A single plain image.
    Single(String),
    /// Primary image first, then the additional images in their original order.
    Carousel(Vec<String>),
}

impl ImageGallery {
    /// Build a gallery from the primary image and any additional images.
    #[must_use]
    pub fn new(primary: &str, additional: &[String]) -> Self {
        if additional.is_empty() {
            return Self::Single(primary.to_owned());
        }

        let mut urls = Vec::with_capacity(additional.len() + 1);
        urls.push(primary.to_owned());
        urls.extend(additional.iter().cloned());
        Self::Carousel(urls)
    }

    /// All image URLs in display order.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Self::Single(url) => vec![url.as_str()],
            Self::Carousel(urls) => urls.iter().map(String::as_str).collect(),
        }
    }

    #[must_use]
    pub const fn is_carousel(&self) -> bool {
        matches!(self, Self::Carousel(_))
    }
}

/// A country option for the shipping address form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: CountryCode,
    pub name: String,
}
