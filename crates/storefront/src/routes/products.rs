//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use smile_cart_core::ProductSlug;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::Visitor;
use crate::product::{ProductDisplay, ProductPage, ProductPhase};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub mrp: String,
    pub offer_price: String,
    pub discount_amount: Option<String>,
    pub discount_label: Option<String>,
    pub images: Vec<String>,
    pub carousel: bool,
    pub available_quantity: u32,
    pub in_stock: bool,
}

impl From<ProductDisplay> for ProductView {
    fn from(display: ProductDisplay) -> Self {
        Self {
            slug: display.slug.to_string(),
            in_stock: display.in_stock(),
            carousel: display.gallery.is_carousel(),
            images: display
                .gallery
                .urls()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            name: display.name,
            description: display.description,
            mrp: display.mrp.to_string(),
            offer_price: display.offer_price.to_string(),
            discount_amount: display.discount.map(|d| d.amount.to_string()),
            discount_label: display.discount.map(|d| d.percentage_label()),
            available_quantity: display.available_quantity,
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub title: String,
    pub cart_count: u32,
    pub product: ProductView,
    pub in_cart: u32,
}

/// Product error page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/error.html")]
pub struct ProductErrorTemplate {
    pub title: String,
    pub cart_count: u32,
    pub not_found: bool,
}

/// Display product detail page.
#[instrument(skip(state, visitor), fields(visitor = %visitor.id))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(slug): Path<String>,
) -> Response {
    let page = ProductPage::new(ProductSlug::new(slug));
    let cart_count = visitor.cart().total_quantity();

    match page.load(state.store()).await {
        ProductPhase::Loaded(display) => {
            add_breadcrumb(
                "navigation",
                "Viewed product page",
                Some(&[("slug", page.slug().as_str())]),
            );
            let in_cart = visitor.cart().quantity(page.slug());
            ProductShowTemplate {
                title: display.name.clone(),
                cart_count,
                product: display.into(),
                in_cart,
            }
            .into_response()
        }
        ProductPhase::Error(error) => {
            let not_found = error.is_not_found();
            let status = if not_found {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_GATEWAY
            };
            let title = if not_found {
                "Product not found"
            } else {
                "Something went wrong"
            };
            (
                status,
                ProductErrorTemplate {
                    title: title.to_string(),
                    cart_count,
                    not_found,
                },
            )
                .into_response()
        }
        // `load` always settles on a result.
        ProductPhase::Loading => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
