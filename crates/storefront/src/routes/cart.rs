//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Each mutation answers HTMX requests with the cart count badge and an
//! `HX-Trigger: cart-updated` header; plain form posts are redirected.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use smile_cart_core::{CartSummary, ProductSlug};
use tracing::instrument;

use crate::api::StoreApi;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::Visitor;
use crate::remote;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub slug: String,
    pub name: String,
    pub image_url: String,
    pub quantity: u32,
    pub max_quantity: u32,
    pub unit_price: String,
    pub line_price: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub title: String,
    pub cart_count: u32,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub unavailable: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub slug: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub slug: String,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("HX-Request")
}

/// Answer a cart mutation: the badge for HTMX, a redirect otherwise.
fn cart_updated(headers: &HeaderMap, visitor: &Visitor, fallback: &str) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: visitor.cart().total_quantity(),
            },
        )
            .into_response()
    } else {
        Redirect::to(fallback).into_response()
    }
}

/// Display cart page.
#[instrument(skip(state, visitor), fields(visitor = %visitor.id))]
pub async fn show(State(state): State<AppState>, visitor: Visitor) -> impl IntoResponse {
    let items = visitor.cart().snapshot();
    let products = remote::fetch_cart_products(state.store(), &items.keys()).await;
    let loaded = products.data().map_or(&[][..], Vec::as_slice);

    let lines = items
        .iter()
        .filter_map(|(slug, quantity)| {
            let product = loaded.iter().find(|p| &p.slug == slug)?;
            Some(CartLineView {
                slug: slug.to_string(),
                name: product.name.clone(),
                image_url: product.image_url.clone(),
                quantity,
                max_quantity: product.available_quantity.max(quantity),
                unit_price: product.offer_price.to_string(),
                line_price: (product.offer_price * quantity).to_string(),
            })
        })
        .collect();

    CartShowTemplate {
        title: "Cart".to_string(),
        cart_count: items.total_quantity(),
        lines,
        total: CartSummary::compute(&items, loaded)
            .total_offer_price
            .to_string(),
        unavailable: products.is_error(),
    }
}

/// Add item to cart (HTMX).
///
/// The line never exceeds the product's available quantity.
#[instrument(skip(state, visitor, headers), fields(visitor = %visitor.id))]
pub async fn add(
    State(state): State<AppState>,
    visitor: Visitor,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let slug = ProductSlug::new(form.slug);
    let product = state.store().product(&slug).await?;

    let current = visitor.cart().quantity(&slug);
    let wanted = current.saturating_add(form.quantity.unwrap_or(1).max(1));
    let capped = wanted.min(product.available_quantity);
    if capped == 0 {
        return Err(AppError::BadRequest(format!("{slug} is out of stock")));
    }

    if visitor.cart().set_quantity(slug.clone(), capped) {
        add_breadcrumb("cart", "Added to cart", Some(&[("slug", slug.as_str())]));
    }

    Ok(cart_updated(&headers, &visitor, &format!("/products/{slug}")))
}

/// Update cart item quantity (HTMX). Zero removes the line.
#[instrument(skip(state, visitor, headers), fields(visitor = %visitor.id))]
pub async fn update(
    State(state): State<AppState>,
    visitor: Visitor,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let slug = ProductSlug::new(form.slug);
    let quantity = if form.quantity == 0 {
        0
    } else {
        let product = state.store().product(&slug).await?;
        form.quantity.min(product.available_quantity)
    };

    visitor.cart().set_quantity(slug, quantity);
    Ok(cart_updated(&headers, &visitor, "/cart"))
}

/// Remove item from cart (HTMX).
#[instrument(skip(visitor, headers), fields(visitor = %visitor.id))]
pub async fn remove(
    visitor: Visitor,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    visitor.cart().remove(&ProductSlug::new(form.slug));
    cart_updated(&headers, &visitor, "/cart")
}

/// Get cart count badge (HTMX).
pub async fn count(visitor: Visitor) -> impl IntoResponse {
    CartCountTemplate {
        count: visitor.cart().total_quantity(),
    }
}
