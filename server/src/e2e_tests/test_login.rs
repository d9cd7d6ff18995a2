//! End-to-end tests for `POST /api/login`.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};

use crate::e2e_tests::helpers::{
    TEST_EMAIL, TEST_PASSWORD, TestApp, body_json, credentials_json, get, login_request,
    session_token, set_cookie,
};

#[tokio::test]
async fn test_login_with_correct_credentials() {
    let app = TestApp::new();

    let response = app
        .send(login_request(&credentials_json(TEST_EMAIL, TEST_PASSWORD)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).expect("cookie is set");
    assert!(cookie.starts_with("auth="));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=3600"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
    assert!(session_token(&response).is_some());

    assert_eq!(body_json(response).await, serde_json::json!({ "success": true }));
}

#[tokio::test]
async fn test_login_cookie_grants_access_to_dashboard() {
    let app = TestApp::new();
    let token = app.login().await;

    let response = app.send(get("/dashboard", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_wrong_credentials() {
    let app = TestApp::new();

    for (email, password) in [
        (TEST_EMAIL, "wrong-password"),
        ("other@example.com", TEST_PASSWORD),
        ("", ""),
    ] {
        let response = app
            .send(login_request(&credentials_json(email, password)))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookie(&response).is_none());
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "success": false, "message": "認証失敗" })
        );
    }
}

#[tokio::test]
async fn test_login_with_missing_fields_is_rejected() {
    let app = TestApp::new();

    for body in [
        r#"{"email":"user@example.com"}"#,
        r#"{"password":"secret123"}"#,
        "{}",
        r#"{"email":null,"password":"secret123"}"#,
    ] {
        let response = app.send(login_request(body)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "body: {body}");
        assert!(set_cookie(&response).is_none());
    }
}

#[tokio::test]
async fn test_login_with_malformed_body_is_rejected() {
    let app = TestApp::new();

    for body in ["not json", r#"{"email": 42, "password": true}"#, ""] {
        let response = app.send(login_request(body)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "body: {body}");
        assert!(set_cookie(&response).is_none());
    }
}

#[tokio::test]
async fn test_login_without_json_content_type_is_rejected() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=user%40example.com&password=secret123"))
        .expect("valid request");
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "success": false, "message": "認証失敗" })
    );
}

#[tokio::test]
async fn test_login_sets_secure_cookie_when_configured() {
    let mut config = crate::e2e_tests::helpers::test_config();
    config.cookie_secure = true;
    let app = TestApp::with_config(&config);

    let response = app
        .send(login_request(&credentials_json(TEST_EMAIL, TEST_PASSWORD)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).expect("cookie is set").ends_with("; Secure"));
}
