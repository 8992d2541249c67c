//! Smile Cart Core - Shared domain types.
//!
//! This crate provides the types used by the storefront and its tests:
//! products, countries, the cart mapping, checkout form values and order
//! payloads.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session access. Everything here can be unit tested without a
//! runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype keys, money, products, cart mapping and checkout data

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
