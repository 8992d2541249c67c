//! Reactive cart store.
//!
//! A [`CartStore`] holds one visitor's [`CartItems`] in a `tokio::sync::watch`
//! channel. Every mutation that changes the mapping notifies all subscribers;
//! no-op mutations stay silent. Handles are cheap to clone and all clones see
//! the same cart, so the store is passed explicitly to whoever needs it.

use std::sync::Arc;

use smile_cart_core::{CartItems, ProductSlug};
use tokio::sync::watch;

/// Shared, observable cart mapping.
#[derive(Clone, Debug)]
pub struct CartStore {
    items: Arc<watch::Sender<CartItems>>,
}

/// Action handle returned by [`CartStore::pick`].
#[derive(Clone, Debug)]
pub struct CartActions {
    store: CartStore,
}

impl CartActions {
    /// Empty the cart.
    pub fn clear_cart(&self) {
        self.store.clear();
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_items(CartItems::new())
    }

    #[must_use]
    pub fn with_items(items: CartItems) -> Self {
        let (items, _) = watch::channel(items);
        Self {
            items: Arc::new(items),
        }
    }

    /// Current snapshot plus an action handle.
    #[must_use]
    pub fn pick(&self) -> (CartItems, CartActions) {
        (
            self.snapshot(),
            CartActions {
                store: self.clone(),
            },
        )
    }

    /// A copy of the current mapping.
    #[must_use]
    pub fn snapshot(&self) -> CartItems {
        self.items.borrow().clone()
    }

    /// Receive a notification after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartItems> {
        self.items.subscribe()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.borrow().total_quantity()
    }

    #[must_use]
    pub fn quantity(&self, slug: &ProductSlug) -> u32 {
        self.items.borrow().quantity(slug)
    }

    /// Add `quantity` to a line. Returns whether the cart changed.
    pub fn add(&self, slug: ProductSlug, quantity: u32) -> bool {
        self.items.send_if_modified(|items| items.add(slug, quantity))
    }

    /// Set a line's quantity; 0 removes it. Returns whether the cart changed.
    pub fn set_quantity(&self, slug: ProductSlug, quantity: u32) -> bool {
        self.items.send_if_modified(|items| items.set(slug, quantity))
    }

    /// Remove a line. Returns whether it was present.
    pub fn remove(&self, slug: &ProductSlug) -> bool {
        self.items.send_if_modified(|items| items.remove(slug))
    }

    /// Remove every line. Returns whether the cart had any.
    pub fn clear(&self) -> bool {
        let cleared = self.items.send_if_modified(CartItems::clear);
        if cleared {
            tracing::debug!("Cart cleared");
        }
        cleared
    }
}
