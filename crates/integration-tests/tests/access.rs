//! Access resolution and owned-product views.

#![allow(clippy::unwrap_used)]

use serde_json::{Value, json};

use sheetshop_integration_tests::{BUYER_INIT_DATA, MockGateway, TestContext, sample_rows};

async fn context() -> (MockGateway, TestContext) {
    let gateway = MockGateway::start().await;
    gateway.set_products(sample_rows());
    let ctx = TestContext::start(&gateway).await;
    ctx.sync_catalog().await;
    (gateway, ctx)
}

#[tokio::test]
async fn test_access_tokens_are_normalized() {
    let (gateway, ctx) = context().await;
    gateway.set_access(7, json!({"status": "success", "access": ["  COURSE-1 ", 42, null]}));

    let body: Value = ctx
        .get_as("/api/access", BUYER_INIT_DATA)
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["userId"], 7);
    assert_eq!(body["refresh"], "applied");
    assert_eq!(body["owned"], json!(["course-1"]));
    assert_eq!(body["busy"], false);
}

#[tokio::test]
async fn test_wildcard_owns_everything() {
    let (gateway, ctx) = context().await;
    gateway.set_access(7, json!({"status": "success", "access": ["ALL"]}));

    let body: Value = ctx
        .get_as("/api/access", BUYER_INIT_DATA)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["owned"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_error_shape_clears_access() {
    let (gateway, ctx) = context().await;
    gateway.set_access(7, json!({"status": "success", "access": ["course-1"]}));
    ctx.get_as("/api/access", BUYER_INIT_DATA).await;

    gateway.set_access(7, json!({"status": "error", "message": "quota"}));
    let body: Value = ctx
        .get_as("/api/access", BUYER_INIT_DATA)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["refresh"], "applied");
    assert!(body["owned"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_account_lists_owned_and_unlocks_secret() {
    let (gateway, ctx) = context().await;
    gateway.set_access(7, json!({"status": "success", "access": ["course-1"]}));

    let html = ctx.get_as("/account", BUYER_INIT_DATA).await.text().await.unwrap();
    assert!(html.contains("Rust Course"));
    assert!(!html.contains("Free Guide"));
    assert!(html.contains("/products/course-1/secret"));

    let secret = ctx
        .get_as("/products/course-1/secret", BUYER_INIT_DATA)
        .await
        .text()
        .await
        .unwrap();
    assert!(secret.contains("Lesson vault password: ferris"));
}

#[tokio::test]
async fn test_identity_survives_in_session() {
    let (gateway, ctx) = context().await;
    gateway.set_access(7, json!({"status": "success", "access": ["course-1"]}));

    // The first request carries init data; later ones only the cookie.
    ctx.get_as("/", BUYER_INIT_DATA).await;
    let html = ctx.get("/account").await.text().await.unwrap();
    assert!(html.contains("Rust Course"));
    assert!(!html.contains("Open the store from Telegram"));
}

#[tokio::test]
async fn test_guest_sees_prompt_and_no_secret() {
    let (_gateway, ctx) = context().await;

    let html = ctx.get("/account").await.text().await.unwrap();
    assert!(html.contains("Open the store from Telegram"));

    let response = ctx.get("/products/course-1/secret").await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
