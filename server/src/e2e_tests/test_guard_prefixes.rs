//! End-to-end tests for the prefix policy: only `/dashboard` and paths
//! below it are protected.

use axum::http::StatusCode;

use crate::e2e_tests::helpers::{TestApp, get, location, logout_request, set_cookie};
use crate::guard::{DEFAULT_PROTECTED_PREFIXES, GuardPolicy};

fn prefix_app() -> TestApp {
    TestApp::with_policy(GuardPolicy::protected_prefixes(DEFAULT_PROTECTED_PREFIXES))
}

#[tokio::test]
async fn test_dashboard_still_protected() {
    let app = prefix_app();

    let response = app.send(get("/dashboard", None)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    let response = app.send(get("/dashboard/settings", None)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let token = app.login().await;
    let response = app.send(get("/dashboard", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unlisted_paths_are_public() {
    let app = prefix_app();

    let response = app.send(get("/reports", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.send(get("/dashboards", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_without_session_clears_cookie() {
    let app = prefix_app();

    let response = app.send(logout_request(None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).expect("cookie is cleared").contains("Max-Age=0"));
}
