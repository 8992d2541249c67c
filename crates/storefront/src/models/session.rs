//! Session keys.
//!
//! The session is the visitor's durable storage. Besides their identity it
//! holds the values written through [`crate::storage::SessionStorage`].

/// Session keys for storefront data.
pub mod keys {
    /// Key for the visitor id that selects their cart and checkout page.
    pub const VISITOR_ID: &str = "visitor_id";
}
