//! Core types for Smile Cart.
//!
//! This module provides type-safe wrappers for the storefront domain.

pub mod cart;
pub mod checkout;
pub mod email;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{CartItems, CartSummary};
pub use checkout::{
    CheckoutDetails, CheckoutForm, FieldError, FormErrors, Order, OrderLine, OrderPayload,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Discount, MinorUnits};
pub use product::{Country, ImageGallery, Product, ProductError};
