//! Integration tests for browsing and the cart.
//!
//! Each test starts its own storefront against an in-process fake store API.
//!
//! Run with: cargo test -p smile-cart-integration-tests

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use smile_cart_integration_tests::{FAILING_SLUG, OVERPRICED_SLUG, TestApp};

// ============================================================================
// Infrastructure
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;
    let resp = app.client().get("/health").await;

    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = TestApp::spawn().await;
    let resp = app.client().get("/health/ready").await;

    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_static_assets_served() {
    let app = TestApp::spawn().await;
    let resp = app.client().get("/static/css/main.css").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.header("content-type").unwrap().starts_with("text/css"));
}

#[tokio::test]
async fn test_every_response_carries_security_headers_and_request_id() {
    let app = TestApp::spawn().await;
    let resp = app.client().get("/").await;

    assert_eq!(resp.header("x-frame-options"), Some("DENY"));
    assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
    assert!(resp.header("content-security-policy").is_some());
    assert!(resp.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let app = TestApp::spawn().await;
    let resp = app
        .client()
        .get_with("/health", &[("x-request-id", "edge-7")])
        .await;

    assert_eq!(resp.header("x-request-id"), Some("edge-7"));
}

// ============================================================================
// Browsing
// ============================================================================

#[tokio::test]
async fn test_home_lists_catalogue() {
    let app = TestApp::spawn().await;
    let resp = app.client().get("/").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("<title>Smile Cart</title>"));
    assert!(resp.body.contains("/products/infinity-kettle"));
    assert!(resp.body.contains("/products/tea-set"));
}

#[tokio::test]
async fn test_product_page_shows_prices_and_discount() {
    let app = TestApp::spawn().await;
    let resp = app.client().get("/products/infinity-kettle").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("infinity kettle | Smile Cart"));
    assert!(resp.body.contains("$10.00"));
    assert!(resp.body.contains("$8.00"));
    assert!(resp.body.contains("20.0% off"));
    assert!(resp.body.contains("you save $2.00"));
    assert!(!resp.body.contains("carousel-slide"));
}

#[tokio::test]
async fn test_product_with_extra_images_uses_carousel() {
    let app = TestApp::spawn().await;
    let resp = app.client().get("/products/tea-set").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("66.7% off"));

    let primary = resp.body.find("tea-set.png").unwrap();
    let side = resp.body.find("tea-side.png").unwrap();
    let top = resp.body.find("tea-top.png").unwrap();
    assert!(primary < side && side < top);
    assert_eq!(resp.body.matches("carousel-slide").count(), 3);
}

#[tokio::test]
async fn test_unknown_product_is_404_page() {
    let app = TestApp::spawn().await;
    let resp = app.client().get("/products/no-such-thing").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.contains("Product not found"));
}

#[tokio::test]
async fn test_store_api_failure_is_502_page() {
    let app = TestApp::spawn().await;
    let resp = app
        .client()
        .get(&format!("/products/{FAILING_SLUG}"))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert!(resp.body.contains("Something went wrong"));
    assert!(!resp.body.contains("Product not found"));
}

#[tokio::test]
async fn test_product_priced_above_mrp_is_502_page() {
    let app = TestApp::spawn().await;
    let resp = app
        .client()
        .get(&format!("/products/{OVERPRICED_SLUG}"))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert!(resp.body.contains("Something went wrong"));
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_add_to_cart_htmx_returns_badge() {
    let app = TestApp::spawn().await;
    let mut client = app.client();

    let resp = client
        .hx_post("/cart/add", &[("slug", "infinity-kettle"), ("quantity", "2")])
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("hx-trigger"), Some("cart-updated"));
    assert!(resp.body.contains(r#"id="cart-count""#));
    assert!(resp.body.contains(">2<"));
}

#[tokio::test]
async fn test_add_to_cart_form_post_redirects_to_product() {
    let app = TestApp::spawn().await;
    let mut client = app.client();

    let resp = client
        .post_form("/cart/add", &[("slug", "infinity-kettle")])
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/products/infinity-kettle"));
}

#[tokio::test]
async fn test_cart_is_per_visitor() {
    let app = TestApp::spawn().await;
    let mut alice = app.client();
    let mut bob = app.client();

    alice
        .hx_post("/cart/add", &[("slug", "tea-set"), ("quantity", "3")])
        .await;

    assert!(alice.get("/cart/count").await.body.contains(">3<"));
    assert!(bob.get("/cart/count").await.body.contains(">0<"));
}

#[tokio::test]
async fn test_add_is_capped_at_available_quantity() {
    let app = TestApp::spawn().await;
    let mut client = app.client();

    client
        .hx_post("/cart/add", &[("slug", "tea-set"), ("quantity", "4")])
        .await;
    let resp = client
        .hx_post("/cart/add", &[("slug", "tea-set"), ("quantity", "4")])
        .await;

    assert!(resp.body.contains(">5<"));
}

#[tokio::test]
async fn test_add_unknown_product_is_404() {
    let app = TestApp::spawn().await;
    let resp = app
        .client()
        .hx_post("/cart/add", &[("slug", "no-such-thing")])
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_page_lists_lines_and_total() {
    let app = TestApp::spawn().await;
    let mut client = app.client();

    client
        .hx_post("/cart/add", &[("slug", "infinity-kettle"), ("quantity", "2")])
        .await;
    client.hx_post("/cart/add", &[("slug", "tea-set")]).await;

    let resp = client.get("/cart").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("infinity kettle"));
    assert!(resp.body.contains("tea set"));
    // 2 x $8.00 + $3.33
    assert!(resp.body.contains("$19.33"));
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let app = TestApp::spawn().await;
    let mut client = app.client();

    client.hx_post("/cart/add", &[("slug", "tea-set")]).await;
    let resp = client
        .hx_post("/cart/update", &[("slug", "tea-set"), ("quantity", "0")])
        .await;

    assert!(resp.body.contains(">0<"));
    assert!(client.get("/cart").await.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_remove_line() {
    let app = TestApp::spawn().await;
    let mut client = app.client();

    client.hx_post("/cart/add", &[("slug", "tea-set")]).await;
    client.hx_post("/cart/add", &[("slug", "infinity-kettle")]).await;

    let resp = client.post_form("/cart/remove", &[("slug", "tea-set")]).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/cart"));

    let count = client.get("/cart/count").await;
    assert!(count.body.contains(">1<"));
}
