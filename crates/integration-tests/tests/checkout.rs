//! Checkout flow and gateway pings.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use sheetshop_integration_tests::{BUYER_INIT_DATA, MockGateway, TestContext, sample_rows};

const VALID_FORM: &[(&str, &str)] = &[
    ("name", "Ann Lee"),
    ("email", "ann@example.com"),
    ("consent_offer", "on"),
    ("consent_privacy", "on"),
];

async fn context() -> (MockGateway, TestContext) {
    let gateway = MockGateway::start().await;
    gateway.set_products(sample_rows());
    let ctx = TestContext::start(&gateway).await;
    ctx.sync_catalog().await;
    (gateway, ctx)
}

#[tokio::test]
async fn test_page_views_send_session_pings() {
    let (gateway, ctx) = context().await;

    ctx.get_as("/", BUYER_INIT_DATA).await;
    ctx.get_as("/catalog", BUYER_INIT_DATA).await;

    let sessions = gateway.wait_for("session", 2).await;
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|e| e["userId"] == "7" && e["username"] == "buyer"));

    let mut pages: Vec<_> = sessions.iter().map(|e| e["page"].as_str().unwrap()).collect();
    pages.sort_unstable();
    assert_eq!(pages, ["catalog", "home"]);
}

#[tokio::test]
async fn test_detail_then_checkout_then_payment() {
    let (gateway, ctx) = context().await;

    let detail = ctx.get_as("/products/course-1", BUYER_INIT_DATA).await;
    assert_eq!(detail.status(), StatusCode::OK);
    let html = detail.text().await.unwrap();
    assert!(html.contains(r#"src="https://cdn.example.com/rust.png""#));

    let form = ctx.get_as("/checkout/course-1", BUYER_INIT_DATA).await;
    assert_eq!(form.status(), StatusCode::OK);
    assert!(form.text().await.unwrap().contains(r#"value="Ann""#));

    let payment = ctx
        .post_form_as("/checkout/course-1", BUYER_INIT_DATA, VALID_FORM)
        .await;
    assert_eq!(payment.status(), StatusCode::OK);
    let html = payment.text().await.unwrap();
    assert!(html.contains("<iframe"));
    assert!(html.contains("https://pay.example.com/checkout?order_id=ORD-"));

    let orders = gateway.wait_for("order", 1).await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert!(order["orderId"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(order["productId"], "course-1");
    assert_eq!(order["productTitle"], "Rust Course");
    assert_eq!(order["price"], "1990");
    assert_eq!(order["name"], "Ann Lee");
    assert_eq!(order["email"], "ann@example.com");
    assert_eq!(order["userId"], "7");
    assert_eq!(order["username"], "buyer");
}

#[tokio::test]
async fn test_invalid_form_sends_no_order() {
    let (gateway, ctx) = context().await;
    ctx.get_as("/checkout/course-1", BUYER_INIT_DATA).await;

    let response = ctx
        .post_form_as(
            "/checkout/course-1",
            BUYER_INIT_DATA,
            &[("name", "Ann"), ("email", "not-an-email"), ("consent_offer", "on")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = response.text().await.unwrap();
    assert!(html.contains("invalid"));

    // Pings are async; give a stray one time to show up.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(gateway.events_of("order").is_empty());
    assert_eq!(ctx.state.telemetry().dispatched().orders, 0);
}

#[tokio::test]
async fn test_product_payment_link_is_used() {
    let gateway = MockGateway::start().await;
    gateway.set_products(serde_json::json!([{
        "id": "pro",
        "title": "Pro Plan",
        "price": "500",
        "paymentId": "https://provider.example.com/pay/pro"
    }]));
    let ctx = TestContext::start(&gateway).await;
    ctx.sync_catalog().await;

    ctx.get_as("/checkout/pro", BUYER_INIT_DATA).await;
    let html = ctx
        .post_form_as("/checkout/pro", BUYER_INIT_DATA, VALID_FORM)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("https://provider.example.com/pay/pro?order_id=ORD-"));
}
