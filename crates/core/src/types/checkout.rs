//! Checkout form values, their validation rules and the order payload.

use serde::{Deserialize, Serialize};

use crate::types::{CartItems, Country, CountryCode, Email, OrderId, ProductSlug};

/// Country preselected on a fresh checkout form.
pub const DEFAULT_COUNTRY_CODE: &str = "US";

/// Shipping and contact details entered at checkout.
///
/// Stored verbatim in the visitor's local storage when they opt in, so the
/// fields stay plain strings rather than parsed types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    pub email: String,
    pub country: CountryCode,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub zip_code: String,
}

impl Default for CheckoutDetails {
    fn default() -> Self {
        Self {
            email: String::new(),
            country: CountryCode::new(DEFAULT_COUNTRY_CODE),
            first_name: String::new(),
            last_name: String::new(),
            address: String::new(),
            apartment: String::new(),
            city: String::new(),
            zip_code: String::new(),
        }
    }
}

impl CheckoutDetails {
    /// Validate every field.
    ///
    /// `countries` is the loaded country list; when it is empty the country
    /// is only checked for presence.
    ///
    /// # Errors
    ///
    /// Returns all field errors found, in form order.
    pub fn validate(&self, countries: &[Country]) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();

        if let Err(e) = Email::parse(&self.email) {
            errors.push("email", e.to_string());
        }

        if self.country.as_str().trim().is_empty() {
            errors.push("country", "country is required");
        } else if !countries.is_empty()
            && !countries
                .iter()
                .any(|c| c.code.as_str() == self.country.as_str().trim())
        {
            errors.push("country", "please select a country from the list");
        }

        for (field, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("address", &self.address),
            ("apartment", &self.apartment),
            ("city", &self.city),
        ] {
            if value.trim().is_empty() {
                errors.push(field, format!("{} is required", field_label(field)));
            }
        }

        let zip = self.zip_code.trim();
        if zip.is_empty() {
            errors.push("zipCode", "zip code is required");
        } else if !is_valid_zip(zip) {
            errors.push("zipCode", "zip code must be 5-10 letters, digits, spaces or dashes");
        }

        errors.into_result()
    }
}

fn field_label(field: &str) -> &'static str {
    match field {
        "firstName" => "first name",
        "lastName" => "last name",
        "address" => "address",
        "apartment" => "apartment",
        "city" => "city",
        _ => "field",
    }
}

fn is_valid_zip(zip: &str) -> bool {
    (5..=10).contains(&zip.len())
        && zip
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
}

/// A submitted checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    pub details: CheckoutDetails,
    /// Keep `details` in local storage for the next checkout. Never validated.
    pub save_for_next_time: bool,
}

/// A validation failure for one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name as used in the HTML form (camelCase).
    pub field: &'static str,
    pub message: String,
}

/// Collected validation failures.
#[derive(thiserror::Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{} invalid field(s)", .errors.len())]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message reported for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub slug: ProductSlug,
    pub quantity: u32,
}

/// Body of the order creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub details: CheckoutDetails,
    pub items: Vec<OrderLine>,
}

impl OrderPayload {
    /// Assemble the payload from the form details and the cart at submit time.
    #[must_use]
    pub fn new(details: CheckoutDetails, cart: &CartItems) -> Self {
        Self {
            details,
            items: cart.order_lines(),
        }
    }
}

/// An order accepted by the store API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: Option<String>,
}
