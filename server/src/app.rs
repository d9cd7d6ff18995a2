//! Router and shared application state.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{CredentialCheck, TokenService};
use crate::config::ServerConfig;
use crate::guard::{Guard, LOGIN_API_PATH, LOGIN_PATH, require_session};
use crate::handlers::{pages, session};
use crate::time::{SystemTimeSource, TimeSource};

/// State shared by every request. Read-only after startup.
#[derive(Clone)]
#[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected for shared state
pub struct AppState {
    /// Issues and verifies session tokens.
    pub tokens: Arc<TokenService>,
    /// The configured identity.
    pub credentials: Arc<CredentialCheck>,
    /// Per-request session check.
    pub guard: Arc<Guard>,
    /// Add the `Secure` attribute to session cookies.
    pub cookie_secure: bool,
    /// URL embedded on the dashboard.
    pub dashboard_embed_url: Option<String>,
}

impl AppState {
    /// Build state from configuration using the system clock.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Build state from configuration with an explicit clock.
    #[must_use]
    #[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected for shared state
    pub fn with_clock(config: &ServerConfig, clock: Arc<dyn TimeSource>) -> Self {
        let tokens = Arc::new(TokenService::new(&config.signing_key, clock));
        let guard = Arc::new(Guard::new(config.guard_policy.clone(), Arc::clone(&tokens)));
        Self {
            tokens,
            credentials: Arc::new(CredentialCheck::new(config.identity.clone())),
            guard,
            cookie_secure: config.cookie_secure,
            dashboard_embed_url: config.dashboard_embed_url.clone(),
        }
    }
}

/// Build the application router.
///
/// The guard wraps every route and the fallback, so unknown paths are
/// subject to the same policy as known ones.
#[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected for shared state
pub fn router(state: AppState) -> Router {
    let guard = Arc::clone(&state.guard);

    Router::new()
        .route("/", get(pages::home))
        .route(LOGIN_PATH, get(pages::login_page))
        .route("/dashboard", get(pages::dashboard))
        .route("/favicon.ico", get(pages::favicon))
        .route(LOGIN_API_PATH, post(session::login))
        .route("/api/logout", post(session::logout))
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(guard, require_session))
        .with_state(state)
}
