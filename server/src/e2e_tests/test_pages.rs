//! End-to-end tests for the HTML pages.

use axum::http::{StatusCode, header};

use crate::e2e_tests::helpers::{TEST_EMAIL, TestApp, body_text, get, test_config};
use crate::guard::GuardPolicy;

#[tokio::test]
async fn test_home_page_links_to_login() {
    let app = TestApp::new();

    let response = app.send(get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .expect("content type")
        .to_str()
        .expect("ascii")
        .to_string();
    assert!(content_type.starts_with("text/html"));

    let html = body_text(response).await;
    assert!(html.contains("href=\"/login\""));
}

#[tokio::test]
async fn test_login_page_posts_to_api() {
    let app = TestApp::new();

    let html = body_text(app.send(get("/login", None)).await).await;
    assert!(html.contains("fetch('/api/login'"));
    assert!(html.contains("window.location.href = '/dashboard'"));
}

#[tokio::test]
async fn test_dashboard_greets_signed_in_email() {
    let app = TestApp::new();
    let token = app.login().await;

    let html = body_text(app.send(get("/dashboard", Some(&token))).await).await;
    assert!(html.contains(&format!("ようこそ {TEST_EMAIL} さん")));
    assert!(html.contains("fetch('/api/logout'"));
    assert!(!html.contains("<iframe"));
}

#[tokio::test]
async fn test_dashboard_embeds_configured_url() {
    let mut config = test_config();
    config.dashboard_embed_url = Some("https://analytics.example.com/embed?a=1&b=2".to_string());
    let app = TestApp::with_config(&config);
    let token = app.login().await;

    let html = body_text(app.send(get("/dashboard", Some(&token))).await).await;
    assert!(html.contains(r#"<iframe src="https://analytics.example.com/embed?a=1&amp;b=2""#));
}

#[tokio::test]
async fn test_dashboard_greets_guest_when_public() {
    let app = TestApp::with_policy(GuardPolicy::public_allow_list(["/", "/login", "/api/login", "/dashboard"]));

    let html = body_text(app.send(get("/dashboard", None)).await).await;
    assert!(html.contains("ようこそ ゲスト さん"));
}
