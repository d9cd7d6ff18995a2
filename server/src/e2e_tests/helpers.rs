//! Common helpers for end-to-end tests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use tower::ServiceExt;

use crate::app::{AppState, router};
use crate::auth::{Identity, IdentitySource, SESSION_COOKIE_NAME, SigningKey};
use crate::config::ServerConfig;
use crate::guard::GuardPolicy;
use crate::time::ManualTimeSource;

pub const TEST_EMAIL: &str = "user@example.com";
pub const TEST_PASSWORD: &str = "secret123";
const TEST_SECRET: &[u8] = b"e2e-test-signing-key";

/// Configuration used by most tests: default allow-list policy.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        signing_key: SigningKey::new(TEST_SECRET).expect("non-empty key"),
        identity: Identity::new(TEST_EMAIL, TEST_PASSWORD),
        identity_source: IdentitySource::Configured,
        listen_addr: ServerConfig::DEFAULT_LISTEN_ADDR
            .parse()
            .expect("valid default address"),
        listen_port: ServerConfig::DEFAULT_PORT,
        guard_policy: GuardPolicy::default(),
        cookie_secure: false,
        dashboard_embed_url: None,
    }
}

/// A router plus the clock driving its token service.
pub struct TestApp {
    pub router: Router,
    pub clock: ManualTimeSource,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&test_config())
    }

    #[must_use]
    pub fn with_policy(policy: GuardPolicy) -> Self {
        let mut config = test_config();
        config.guard_policy = policy;
        Self::with_config(&config)
    }

    #[must_use]
    pub fn with_config(config: &ServerConfig) -> Self {
        let clock = ManualTimeSource::default_start();
        let state = AppState::with_clock(config, Arc::new(clock.clone()));
        Self {
            router: router(state),
            clock,
        }
    }

    /// Send a request through the full router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Log in with the test identity and return the session token.
    pub async fn login(&self) -> String {
        let response = self
            .send(login_request(&credentials_json(TEST_EMAIL, TEST_PASSWORD)))
            .await;
        session_token(&response).expect("login sets the session cookie")
    }
}

pub fn credentials_json(email: &str, password: &str) -> String {
    serde_json::json!({ "email": email, "password": password }).to_string()
}

pub fn login_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub fn logout_request(token: Option<&str>) -> Request<Body> {
    with_cookie(Request::builder().method("POST").uri("/api/logout"), token)
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    with_cookie(Request::builder().method("GET").uri(path), token)
}

fn with_cookie(builder: axum::http::request::Builder, token: Option<&str>) -> Request<Body> {
    let builder = match token {
        Some(token) => builder.header(header::COOKIE, format!("{SESSION_COOKIE_NAME}={token}")),
        None => builder,
    };
    builder.body(Body::empty()).expect("valid request")
}

/// The raw `Set-Cookie` header, if any.
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().expect("ascii cookie").to_string())
}

/// The session token carried by the `Set-Cookie` header, if any.
pub fn session_token(response: &Response<Body>) -> Option<String> {
    let cookie = set_cookie(response)?;
    let (pair, _attributes) = cookie.split_once(';')?;
    let value = pair.strip_prefix(&format!("{SESSION_COOKIE_NAME}="))?;
    (!value.is_empty()).then(|| value.to_string())
}

/// The redirect target, if the response is a redirect.
pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().expect("ascii location").to_string())
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
