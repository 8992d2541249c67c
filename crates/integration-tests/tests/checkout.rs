//! Integration tests for the checkout page.
//!
//! Covers loading, validation, order placement, the delayed return to the
//! home page and the back control.
//!
//! Run with: cargo test -p smile-cart-integration-tests

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use smile_cart_core::ProductSlug;
use smile_cart_integration_tests::{BASE_URL, TestApp, TestClient, checkout_fields};

/// Short enough to wait out, long enough to observe the pending state.
const FAST_REDIRECT: Duration = Duration::from_millis(200);

/// Long enough that only the back control can end it.
const SLOW_REDIRECT: Duration = Duration::from_secs(60);

async fn fill_cart(client: &mut TestClient) {
    client
        .hx_post("/cart/add", &[("slug", "infinity-kettle"), ("quantity", "2")])
        .await;
    client.hx_post("/cart/add", &[("slug", "tea-set")]).await;
}

async fn cart_count(client: &mut TestClient) -> String {
    client.get("/cart/count").await.body
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn test_empty_cart_redirects_home() {
    let app = TestApp::spawn().await;
    let resp = app.client().get("/checkout").await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/"));
}

#[tokio::test]
async fn test_checkout_page_shows_summary_and_countries() {
    let app = TestApp::spawn().await;
    let mut client = app.client();
    fill_cart(&mut client).await;

    let resp = client.get("/checkout").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Checkout | Smile Cart"));
    assert!(resp.body.contains("United States"));
    assert!(resp.body.contains("India"));
    // mrp 2 x $10.00 + $9.99, offer 2 x $8.00 + $3.33
    assert!(resp.body.contains("$29.99"));
    assert!(resp.body.contains("$19.33"));
    assert!(resp.body.contains(r#"name="saveForNextTime" value="true" checked"#));
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_invalid_form_is_rejected_without_an_order() {
    let app = TestApp::spawn().await;
    let mut client = app.client();
    fill_cart(&mut client).await;
    client.get("/checkout").await;

    let mut fields = checkout_fields(true);
    fields[0] = ("email", "not-an-email");
    fields[7] = ("zipCode", "1");
    let resp = client.post_form("/checkout", &fields).await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body.matches("field-error").count(), 2);
    assert!(resp.body.contains(r#"value="not-an-email""#));
    assert!(app.api.orders().is_empty());
}

#[tokio::test]
async fn test_unknown_country_is_a_field_error() {
    let app = TestApp::spawn().await;
    let mut client = app.client();
    fill_cart(&mut client).await;
    client.get("/checkout").await;

    let mut fields = checkout_fields(false);
    fields[1] = ("country", "ZZ");
    let resp = client.post_form("/checkout", &fields).await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.body.contains("please select a country from the list"));
}

#[tokio::test]
async fn test_submit_without_loading_starts_over() {
    let app = TestApp::spawn().await;
    let mut client = app.client();
    fill_cart(&mut client).await;

    let resp = client.post_form("/checkout", &checkout_fields(true)).await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/checkout"));
    assert!(app.api.orders().is_empty());
}

#[tokio::test]
async fn test_order_placed_then_redirects_home_and_clears_cart() {
    let app = TestApp::spawn_with_redirect_delay(FAST_REDIRECT).await;
    let mut client = app.client();
    fill_cart(&mut client).await;
    client.get("/checkout").await;

    let resp = client.post_form("/checkout", &checkout_fields(true)).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("order-1"));
    assert!(resp.body.contains("oliver@example.com"));
    assert!(resp.body.contains(r#"content="1;url=/""#));

    let orders = app.api.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].details.email, "oliver@example.com");
    let lines: Vec<(ProductSlug, u32)> = orders[0]
        .items
        .iter()
        .map(|line| (line.slug.clone(), line.quantity))
        .collect();
    assert_eq!(
        lines,
        vec![
            (ProductSlug::new("infinity-kettle"), 2),
            (ProductSlug::new("tea-set"), 1),
        ]
    );

    // Cart survives until the redirect fires.
    assert!(cart_count(&mut client).await.contains(">3<"));

    let mut redirected = None;
    for _ in 0..100 {
        let status = client
            .get_with("/checkout/status", &[("HX-Request", "true")])
            .await;
        if status.status == StatusCode::OK {
            redirected = status.header("hx-redirect").map(String::from);
            break;
        }
        assert_eq!(status.status, StatusCode::NO_CONTENT);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(redirected.as_deref(), Some("/"));
    assert!(cart_count(&mut client).await.contains(">0<"));
}

#[tokio::test]
async fn test_saved_details_prefill_next_checkout() {
    let app = TestApp::spawn_with_redirect_delay(SLOW_REDIRECT).await;
    let mut client = app.client();

    fill_cart(&mut client).await;
    client.get("/checkout").await;
    client.post_form("/checkout", &checkout_fields(true)).await;
    client.post_form("/checkout/back", &[]).await;

    fill_cart(&mut client).await;
    let resp = client.get("/checkout").await;

    assert!(resp.body.contains(r#"value="oliver@example.com""#));
    assert!(resp.body.contains(r#"value="Springfield""#));
    assert!(resp.body.contains(r#"<option value="US" selected>"#));
}

#[tokio::test]
async fn test_opting_out_forgets_saved_details() {
    let app = TestApp::spawn_with_redirect_delay(SLOW_REDIRECT).await;
    let mut client = app.client();

    fill_cart(&mut client).await;
    client.get("/checkout").await;
    client.post_form("/checkout", &checkout_fields(true)).await;
    client.post_form("/checkout/back", &[]).await;

    fill_cart(&mut client).await;
    client.get("/checkout").await;
    client.post_form("/checkout", &checkout_fields(false)).await;
    client.post_form("/checkout/back", &[]).await;

    fill_cart(&mut client).await;
    let resp = client.get("/checkout").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(!resp.body.contains("oliver@example.com"));
    assert_eq!(app.api.orders().len(), 2);
}

#[tokio::test]
async fn test_rejected_order_keeps_cart_and_allows_retry() {
    let app = TestApp::spawn_with_redirect_delay(SLOW_REDIRECT).await;
    let mut client = app.client();
    fill_cart(&mut client).await;
    client.get("/checkout").await;

    app.api.reject_orders(true);
    let resp = client.post_form("/checkout", &checkout_fields(true)).await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.body.contains("infinity kettle is out of stock"));
    assert!(resp.body.contains(r#"value="oliver@example.com""#));
    assert!(cart_count(&mut client).await.contains(">3<"));

    app.api.reject_orders(false);
    let resp = client.post_form("/checkout", &checkout_fields(true)).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("order-1"));
}

#[tokio::test]
async fn test_second_submit_after_success_is_refused() {
    let app = TestApp::spawn_with_redirect_delay(SLOW_REDIRECT).await;
    let mut client = app.client();
    fill_cart(&mut client).await;
    client.get("/checkout").await;

    client.post_form("/checkout", &checkout_fields(true)).await;
    let resp = client.post_form("/checkout", &checkout_fields(true)).await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(app.api.orders().len(), 1);
}

// ============================================================================
// Back control
// ============================================================================

#[tokio::test]
async fn test_back_during_pending_redirect_goes_home_and_clears_cart() {
    let app = TestApp::spawn_with_redirect_delay(SLOW_REDIRECT).await;
    let mut client = app.client();
    fill_cart(&mut client).await;
    client.get("/checkout").await;
    client.post_form("/checkout", &checkout_fields(true)).await;

    let resp = client.post_form("/checkout/back", &[]).await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/"));
    assert!(cart_count(&mut client).await.contains(">0<"));

    let status = client.get("/checkout/status").await;
    assert_eq!(status.location(), Some("/"));
}

#[tokio::test]
async fn test_back_before_ordering_returns_to_previous_page() {
    let app = TestApp::spawn().await;
    let mut client = app.client();
    fill_cart(&mut client).await;

    let referer = format!("{BASE_URL}/products/tea-set");
    client
        .get_with("/checkout", &[("referer", referer.as_str())])
        .await;

    let resp = client
        .post_form_with("/checkout/back", &[], &[("HX-Request", "true")])
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("hx-redirect"), Some("/products/tea-set"));
    assert!(cart_count(&mut client).await.contains(">3<"));
    assert!(app.api.orders().is_empty());
}

#[tokio::test]
async fn test_back_from_foreign_referer_goes_home() {
    let app = TestApp::spawn().await;
    let mut client = app.client();
    fill_cart(&mut client).await;

    client
        .get_with("/checkout", &[("referer", "https://elsewhere.test/deals")])
        .await;
    let resp = client.post_form("/checkout/back", &[]).await;

    assert_eq!(resp.location(), Some("/"));
    assert!(cart_count(&mut client).await.contains(">3<"));
}

#[tokio::test]
async fn test_status_while_filling_form_stays_put() {
    let app = TestApp::spawn().await;
    let mut client = app.client();
    fill_cart(&mut client).await;
    client.get("/checkout").await;

    let resp = client
        .get_with("/checkout/status", &[("HX-Request", "true")])
        .await;

    assert_eq!(resp.status, StatusCode::NO_CONTENT);
}
