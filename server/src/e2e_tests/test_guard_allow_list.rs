//! End-to-end tests for the default policy: everything is protected except
//! `/`, `/login`, `/api/login` and `/favicon.ico`.

use axum::http::StatusCode;

use crate::e2e_tests::helpers::{
    TEST_EMAIL, TEST_PASSWORD, TestApp, credentials_json, get, location, login_request,
};

#[tokio::test]
async fn test_public_paths_need_no_cookie() {
    let app = TestApp::new();

    for path in ["/", "/login"] {
        let response = app.send(get(path, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }

    let response = app.send(get("/favicon.ico", None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .send(login_request(&credentials_json(TEST_EMAIL, TEST_PASSWORD)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_paths_ignore_invalid_cookie() {
    let app = TestApp::new();

    let response = app.send(get("/login", Some("garbage"))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_without_cookie_redirects_to_login() {
    let app = TestApp::new();

    let response = app.send(get("/dashboard", None)).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_invalid_tokens_redirect_like_missing_ones() {
    let app = TestApp::new();
    let token = app.login().await;
    let tampered = format!("{token}x");

    for bad in ["garbage", "a.b.c", tampered.as_str()] {
        let response = app.send(get("/dashboard", Some(bad))).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{bad}");
        assert_eq!(location(&response).as_deref(), Some("/login"));
    }
}

#[tokio::test]
async fn test_unknown_paths_are_protected() {
    let app = TestApp::new();

    let response = app.send(get("/reports", None)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let token = app.login().await;
    let response = app.send(get("/reports", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
