//! End-to-end tests for `POST /api/logout`.
//!
//! The server keeps no revocation list. Logout only tells the calling browser
//! to drop its cookie; the token value itself stays valid until it expires.

use axum::http::StatusCode;

use crate::e2e_tests::helpers::{TestApp, body_json, get, location, logout_request, set_cookie};

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();
    let token = app.login().await;

    let response = app.send(logout_request(Some(&token))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).expect("cookie is cleared");
    assert!(cookie.starts_with("auth=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("Path=/"));
    assert_eq!(body_json(response).await, serde_json::json!({ "success": true }));
}

#[tokio::test]
async fn test_browser_without_cookie_after_logout_is_redirected() {
    let app = TestApp::new();
    let token = app.login().await;
    let _ = app.send(logout_request(Some(&token))).await;

    // The browser honored Max-Age=0 and no longer sends the cookie.
    let response = app.send(get("/dashboard", None)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_old_token_still_accepted_after_logout() {
    let app = TestApp::new();
    let token = app.login().await;
    let _ = app.send(logout_request(Some(&token))).await;

    // A copy of the old value still verifies: there is no server-side session.
    let response = app.send(get("/dashboard", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_without_session_is_redirected_under_allow_list() {
    let app = TestApp::new();

    let response = app.send(logout_request(None)).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert!(set_cookie(&response).is_none());
}
