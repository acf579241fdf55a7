//! Admin dashboard against gateway stats.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;

use sheetshop_integration_tests::{ADMIN_INIT_DATA, BUYER_INIT_DATA, MockGateway, TestContext};

#[tokio::test]
async fn test_dashboard_aggregates_stats() {
    let gateway = MockGateway::start().await;
    gateway.set_stats(json!({
        "sessions": [
            {"userId": "7", "page": "home"},
            {"userId": "7", "page": "catalog"},
            {"userId": "8", "page": "home"}
        ],
        "leads": [
            {"orderId": "ORD-1", "productTitle": "Rust Course", "price": 1990, "name": "Ann",
             "email": "ann@example.com", "username": "ann", "timestamp": "2026-01-01T10:00:00Z"},
            {"orderId": "ORD-2", "productTitle": "Rust Course", "price": "1 990", "name": "Bob",
             "email": "bob@example.com", "username": "", "timestamp": "2026-01-02T10:00:00Z"},
            {"orderId": "ORD-3", "productTitle": "Pro Plan", "price": "500", "name": "Cy",
             "email": "cy@example.com", "username": "cy", "timestamp": "2026-01-03T10:00:00Z"}
        ]
    }));
    let ctx = TestContext::start(&gateway).await;

    let response = ctx.get_as("/admin", ADMIN_INIT_DATA).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();

    assert!(html.contains("4480 ₽"));
    assert!(html.contains("2026-01-03 10:00"));
    assert!(html.contains("ORD-2"));
    assert!(html.contains("@cy"));
    // Newest lead first.
    assert!(html.find("ORD-3").unwrap() < html.find("ORD-1").unwrap());
}

#[tokio::test]
async fn test_dashboard_hidden_from_customers() {
    let gateway = MockGateway::start().await;
    let ctx = TestContext::start(&gateway).await;

    let response = ctx.get_as("/admin", BUYER_INIT_DATA).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_stats_render_empty_dashboard() {
    let gateway = MockGateway::start().await;
    gateway.set_stats(json!(["not", "an", "object"]));
    let ctx = TestContext::start(&gateway).await;

    let response = ctx.get_as("/admin", ADMIN_INIT_DATA).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Statistics are unavailable"));
}
