//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use smile_cart_core::Product;
use tracing::instrument;

use crate::filters;
use crate::middleware::Visitor;
use crate::remote;
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub slug: String,
    pub name: String,
    pub image_url: String,
    pub offer_price: String,
    pub mrp: Option<String>,
    pub discount_label: Option<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let discount = product.discount().filter(|d| d.amount.cents() > 0);
        Self {
            slug: product.slug.to_string(),
            name: product.name.clone(),
            image_url: product.image_url.clone(),
            offer_price: product.offer_price.to_string(),
            mrp: discount.map(|_| product.mrp.to_string()),
            discount_label: discount.map(|d| d.percentage_label()),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub title: String,
    pub cart_count: u32,
    pub products: Vec<ProductCardView>,
    pub unavailable: bool,
}

/// Display the home page with the full catalogue.
#[instrument(skip(state, visitor), fields(visitor = %visitor.id))]
pub async fn home(State(state): State<AppState>, visitor: Visitor) -> impl IntoResponse {
    let catalogue = remote::fetch_catalogue(state.store()).await;

    HomeTemplate {
        title: String::new(),
        cart_count: visitor.cart().total_quantity(),
        products: catalogue
            .data()
            .map(|products| products.iter().map(ProductCardView::from).collect())
            .unwrap_or_default(),
        unavailable: catalogue.is_error(),
    }
}

