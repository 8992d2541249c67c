//! Checkout route handlers.
//!
//! The page itself is driven by the visitor's [`CheckoutController`]; these
//! handlers translate its outcomes into HTML, redirects and HTMX headers.
//!
//! After an order is placed the "order placed" page polls
//! `GET /checkout/status` and falls back to a meta refresh; the back control
//! posts to `/checkout/back`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode, header::REFERER},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use smile_cart_core::{CheckoutDetails, CheckoutForm, CountryCode, FormErrors, Order};
use tracing::instrument;
use url::Url;

use crate::api::ApiError;
use crate::checkout::{CheckoutData, CheckoutError, CheckoutPhase, LoadOutcome, Navigation};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::Visitor;
use crate::state::AppState;

/// Checkout line display data for templates.
#[derive(Clone)]
pub struct CheckoutLineView {
    pub name: String,
    pub image_url: String,
    pub quantity: u32,
    pub line_price: String,
}

/// Country `<option>` display data.
#[derive(Clone)]
pub struct CountryOption {
    pub code: String,
    pub name: String,
    pub selected: bool,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutShowTemplate {
    pub title: String,
    pub cart_count: u32,
    pub values: CheckoutDetails,
    pub save_for_next_time: bool,
    pub countries: Vec<CountryOption>,
    pub countries_unavailable: bool,
    pub lines: Vec<CheckoutLineView>,
    pub products_unavailable: bool,
    pub item_count: u32,
    pub total_mrp: String,
    pub total_offer_price: String,
    pub total_discount: Option<String>,
    pub errors: FormErrors,
    pub submit_error: Option<String>,
}

/// Order placed template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/placed.html")]
pub struct CheckoutPlacedTemplate {
    pub title: String,
    pub cart_count: u32,
    pub order_id: String,
    pub email: String,
    /// Whole seconds for the no-script meta refresh.
    pub redirect_secs: u64,
}

/// Checkout form data.
///
/// Field names match the ones used in validation errors. The checkbox is
/// only present in the body when ticked. Values are kept exactly as typed;
/// validation ignores surrounding whitespace.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFormInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub apartment: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip_code: String,
    pub save_for_next_time: Option<String>,
}

impl From<CheckoutFormInput> for CheckoutForm {
    fn from(input: CheckoutFormInput) -> Self {
        Self {
            details: CheckoutDetails {
                email: input.email,
                country: CountryCode::new(input.country),
                first_name: input.first_name,
                last_name: input.last_name,
                address: input.address,
                apartment: input.apartment,
                city: input.city,
                zip_code: input.zip_code,
            },
            save_for_next_time: input.save_for_next_time.is_some(),
        }
    }
}

/// Path of a same-origin `Referer`, used as the back target.
///
/// Checkout pages themselves are never a back target.
#[must_use]
pub fn return_path(headers: &HeaderMap, base_url: &str) -> Option<String> {
    let referer = Url::parse(headers.get(REFERER)?.to_str().ok()?).ok()?;
    let base = Url::parse(base_url).ok()?;
    if referer.origin() != base.origin() {
        return None;
    }

    let path = referer.path();
    if path == "/checkout" || path.starts_with("/checkout/") {
        return None;
    }

    Some(match referer.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    })
}

fn checkout_page(
    data: &CheckoutData,
    cart_count: u32,
    form: CheckoutForm,
    errors: FormErrors,
    submit_error: Option<String>,
) -> CheckoutShowTemplate {
    let products = data.products.data().map_or(&[][..], Vec::as_slice);
    let lines = data
        .cart
        .iter()
        .filter_map(|(slug, quantity)| {
            let product = products.iter().find(|p| &p.slug == slug)?;
            Some(CheckoutLineView {
                name: product.name.clone(),
                image_url: product.image_url.clone(),
                quantity,
                line_price: (product.offer_price * quantity).to_string(),
            })
        })
        .collect();

    let countries = data
        .country_list()
        .iter()
        .map(|c| CountryOption {
            code: c.code.to_string(),
            name: c.name.clone(),
            selected: c.code == form.details.country,
        })
        .collect();

    let summary = data.summary();
    let discount = summary.total_discount();

    CheckoutShowTemplate {
        title: "Checkout".to_string(),
        cart_count,
        values: form.details,
        save_for_next_time: form.save_for_next_time,
        countries,
        countries_unavailable: data.countries.is_error(),
        lines,
        products_unavailable: data.products.is_error(),
        item_count: summary.item_count,
        total_mrp: summary.total_mrp.to_string(),
        total_offer_price: summary.total_offer_price.to_string(),
        total_discount: (discount.cents() > 0).then(|| discount.to_string()),
        errors,
        submit_error,
    }
}

fn placed_page(visitor: &Visitor, order: &Order, email: String, redirect_ms: u128) -> Response {
    CheckoutPlacedTemplate {
        title: "Order placed".to_string(),
        cart_count: visitor.cart().total_quantity(),
        order_id: order.id.to_string(),
        email,
        redirect_secs: u64::try_from(redirect_ms.div_ceil(1000)).unwrap_or(u64::MAX),
    }
    .into_response()
}

/// Redirect that HTMX follows as a full navigation.
fn navigate(headers: &HeaderMap, navigation: &Navigation) -> Response {
    if headers.contains_key("HX-Request") {
        (
            AppendHeaders([("HX-Redirect", navigation.path().to_string())]),
            StatusCode::OK,
        )
            .into_response()
    } else {
        Redirect::to(navigation.path()).into_response()
    }
}

/// Display the checkout page.
#[instrument(skip(state, visitor, headers), fields(visitor = %visitor.id))]
pub async fn show(State(state): State<AppState>, visitor: Visitor, headers: HeaderMap) -> Response {
    let return_to = return_path(&headers, &state.config().base_url);
    let controller = visitor
        .shopper
        .mount_checkout(state.checkout_options(return_to));

    match controller.load(state.store(), &visitor.storage()).await {
        LoadOutcome::Redirect(navigation) => Redirect::to(navigation.path()).into_response(),
        LoadOutcome::Ready(data) => {
            let form = CheckoutForm {
                details: data.initial_values.clone(),
                save_for_next_time: true,
            };
            checkout_page(
                &data,
                visitor.cart().total_quantity(),
                form,
                FormErrors::default(),
                None,
            )
            .into_response()
        }
    }
}

/// Place the order.
#[instrument(skip(state, visitor, input), fields(visitor = %visitor.id))]
pub async fn submit(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(input): Form<CheckoutFormInput>,
) -> Response {
    let Some(controller) = visitor.shopper.checkout() else {
        // Nothing mounted (e.g. the registry forgot this visitor): start over.
        return Redirect::to("/checkout").into_response();
    };
    let Some(data) = controller.data() else {
        return Redirect::to("/checkout").into_response();
    };

    let form = CheckoutForm::from(input);
    let email = form.details.email.clone();

    match controller
        .submit(state.store(), &visitor.storage(), form.clone())
        .await
    {
        Ok(order) => {
            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_id", order.id.as_str())]),
            );
            placed_page(
                &visitor,
                &order,
                email,
                controller.redirect_delay().as_millis(),
            )
        }
        Err(CheckoutError::Invalid(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            checkout_page(
                &data,
                visitor.cart().total_quantity(),
                form,
                errors,
                None,
            ),
        )
            .into_response(),
        Err(CheckoutError::Submission(error)) => {
            let (status, message) = match &error {
                ApiError::Rejected(reason) => (StatusCode::UNPROCESSABLE_ENTITY, reason.clone()),
                ApiError::RateLimited(_) => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Too many orders right now, please try again shortly".to_string(),
                ),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    "We could not place your order, please try again".to_string(),
                ),
            };
            (
                status,
                checkout_page(
                    &data,
                    visitor.cart().total_quantity(),
                    form,
                    FormErrors::default(),
                    Some(message),
                ),
            )
                .into_response()
        }
        Err(CheckoutError::EmptyCart) => Redirect::to(Navigation::Home.path()).into_response(),
        Err(CheckoutError::NotReady(phase)) => match phase {
            CheckoutPhase::Left(navigation) => {
                Redirect::to(navigation.path()).into_response()
            }
            _ => (
                StatusCode::CONFLICT,
                "Your order is already being placed",
            )
                .into_response(),
        },
    }
}

/// Leave checkout through the back control.
#[instrument(skip(visitor, headers), fields(visitor = %visitor.id))]
pub async fn back(visitor: Visitor, headers: HeaderMap) -> Response {
    let navigation = visitor
        .shopper
        .checkout()
        .map_or(Navigation::Home, |controller| controller.back());
    navigate(&headers, &navigation)
}

/// Report whether the checkout page has been left (HTMX polling).
///
/// Answers `204 No Content` while the visitor should stay, and an
/// `HX-Redirect` once the page has been left.
pub async fn status(visitor: Visitor, headers: HeaderMap) -> Response {
    let phase = visitor.shopper.checkout().map(|c| c.phase());
    match phase {
        Some(CheckoutPhase::Left(navigation)) => navigate(&headers, &navigation),
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => navigate(&headers, &Navigation::Home),
    }
}
