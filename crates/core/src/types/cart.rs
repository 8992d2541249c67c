//! The client-side cart mapping.
//!
//! Maps a product slug to the quantity the shopper wants. A line with
//! quantity zero is never stored: lowering a line to zero removes it.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::{MinorUnits, OrderLine, Product, ProductSlug};

/// Product slug to quantity mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItems(BTreeMap<ProductSlug, NonZeroU32>);

impl CartItems {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Quantity for a slug, or 0 when the product is not in the cart.
    #[must_use]
    pub fn quantity(&self, slug: &ProductSlug) -> u32 {
        self.0.get(slug).map_or(0, |qty| qty.get())
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.0
            .values()
            .fold(0_u32, |acc, qty| acc.saturating_add(qty.get()))
    }

    /// The cart keys at this moment, in slug order.
    #[must_use]
    pub fn keys(&self) -> Vec<ProductSlug> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProductSlug, u32)> {
        self.0.iter().map(|(slug, qty)| (slug, qty.get()))
    }

    /// Increase the quantity of a line, creating it if needed.
    ///
    /// Returns `true` if the mapping changed.
    pub fn add(&mut self, slug: ProductSlug, quantity: u32) -> bool {
        let current = self.quantity(&slug);
        self.set(slug, current.saturating_add(quantity))
    }

    /// Set the quantity of a line. A quantity of 0 removes the line.
    ///
    /// Returns `true` if the mapping changed.
    pub fn set(&mut self, slug: ProductSlug, quantity: u32) -> bool {
        match NonZeroU32::new(quantity) {
            Some(qty) => self.0.insert(slug, qty) != Some(qty),
            None => self.0.remove(&slug).is_some(),
        }
    }

    /// Remove a line. Returns `true` if it was present.
    pub fn remove(&mut self, slug: &ProductSlug) -> bool {
        self.0.remove(slug).is_some()
    }

    /// Remove every line. Returns `true` if the cart was not already empty.
    pub fn clear(&mut self) -> bool {
        let changed = !self.0.is_empty();
        self.0.clear();
        changed
    }

    /// Order lines for every cart entry.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.iter()
            .map(|(slug, quantity)| OrderLine {
                slug: slug.clone(),
                quantity,
            })
            .collect()
    }
}

impl FromIterator<(ProductSlug, u32)> for CartItems {
    fn from_iter<I: IntoIterator<Item = (ProductSlug, u32)>>(iter: I) -> Self {
        let mut items = Self::new();
        for (slug, quantity) in iter {
            items.add(slug, quantity);
        }
        items
    }
}

/// Totals for the checkout order summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartSummary {
    pub total_mrp: MinorUnits,
    pub total_offer_price: MinorUnits,
    pub item_count: u32,
}

impl CartSummary {
    /// Sum the cart lines that have a matching product record.
    ///
    /// Lines without a loaded product contribute only to `item_count`.
    #[must_use]
    pub fn compute(items: &CartItems, products: &[Product]) -> Self {
        let priced = items.iter().filter_map(|(slug, quantity)| {
            products
                .iter()
                .find(|product| &product.slug == slug)
                .map(|product| (product, quantity))
        });

        let (total_mrp, total_offer_price) = priced.fold(
            (MinorUnits::ZERO, MinorUnits::ZERO),
            |(mrp, offer), (product, quantity)| {
                (
                    mrp + product.mrp * quantity,
                    offer + product.offer_price * quantity,
                )
            },
        );

        Self {
            total_mrp,
            total_offer_price,
            item_count: items.total_quantity(),
        }
    }

    /// Savings across the whole cart.
    #[must_use]
    pub fn total_discount(&self) -> MinorUnits {
        self.total_mrp
            .checked_sub(self.total_offer_price)
            .unwrap_or(MinorUnits::ZERO)
    }
}
