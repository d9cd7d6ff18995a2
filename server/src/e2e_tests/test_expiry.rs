//! End-to-end tests for session expiry.

use axum::http::StatusCode;

use crate::auth::TokenService;
use crate::e2e_tests::helpers::{TestApp, get, location};

#[tokio::test]
async fn test_session_valid_for_the_following_hour() {
    let app = TestApp::new();
    let token = app.login().await;

    for elapsed in [0, 60, 1800, TokenService::TOKEN_TTL_SECS - 1] {
        app.clock.set(1_700_000_000 + elapsed);
        let response = app.send(get("/dashboard", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK, "elapsed {elapsed}s");
    }
}

#[tokio::test]
async fn test_session_rejected_after_one_hour() {
    let app = TestApp::new();
    let token = app.login().await;

    app.clock.advance(TokenService::TOKEN_TTL_SECS);
    let response = app.send(get("/dashboard", Some(&token))).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_new_login_after_expiry_restores_access() {
    let app = TestApp::new();
    let _expired = app.login().await;
    app.clock.advance(TokenService::TOKEN_TTL_SECS + 10);

    let token = app.login().await;
    let response = app.send(get("/dashboard", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}
