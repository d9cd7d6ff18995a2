//! Route guard.
//!
//! Every request passes through [`require_session`]. The configured
//! [`GuardPolicy`] decides whether the path needs a session; if it does, the
//! `auth` cookie must carry a token that the [`TokenService`] accepts.
//! Anything else is redirected to the login page.
//!
//! # Invariants
//! - Missing, malformed, tampered and expired tokens all produce the same
//!   redirect. The reason is only logged.
//! - The policy is chosen once at startup and never changes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{SessionClaims, TokenError, TokenService, extract_session_token};

/// Where rejected requests are sent.
pub const LOGIN_PATH: &str = "/login";

/// Login endpoint of the JSON API.
pub const LOGIN_API_PATH: &str = "/api/login";

/// Paths reachable without a session under the allow-list policy.
pub const DEFAULT_PUBLIC_PATHS: [&str; 4] = ["/", LOGIN_PATH, LOGIN_API_PATH, "/favicon.ico"];

/// Paths requiring a session under the prefix policy.
pub const DEFAULT_PROTECTED_PREFIXES: [&str; 1] = ["/dashboard"];

/// Which requests need a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardPolicy {
    /// Protect everything except the listed paths (exact match).
    PublicAllowList { public_paths: Vec<String> },
    /// Protect only the listed prefixes; everything else is public.
    ///
    /// A prefix matches the path itself and anything below it, so
    /// `/dashboard` covers `/dashboard/settings` but not `/dashboards`.
    ProtectedPrefixes { prefixes: Vec<String> },
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self::public_allow_list(DEFAULT_PUBLIC_PATHS)
    }
}

impl GuardPolicy {
    pub fn public_allow_list<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PublicAllowList {
            public_paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn protected_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ProtectedPrefixes {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Short name used in configuration and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PublicAllowList { .. } => "public-allow-list",
            Self::ProtectedPrefixes { .. } => "protected-prefixes",
        }
    }

    /// Whether a request for `path` must carry a valid session.
    #[must_use]
    pub fn requires_auth(&self, path: &str) -> bool {
        match self {
            Self::PublicAllowList { public_paths } => !public_paths.iter().any(|p| p == path),
            Self::ProtectedPrefixes { prefixes } => prefixes
                .iter()
                .any(|prefix| matches_prefix(path, prefix)),
        }
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Why a request was sent back to the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectReason {
    /// The request carried no `auth` cookie.
    MissingToken,
    /// The cookie's token failed verification.
    InvalidToken(TokenError),
}

impl std::fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "no session cookie"),
            Self::InvalidToken(e) => write!(f, "token verification failed: {e}"),
        }
    }
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Public path; no token was checked.
    Allow,
    /// Protected path with a valid session.
    AllowAuthenticated(SessionClaims),
    /// Protected path without a valid session.
    Redirect(RedirectReason),
}

/// Per-request session check.
#[derive(Debug)]
pub struct Guard {
    policy: GuardPolicy,
    tokens: Arc<TokenService>,
}

impl Guard {
    #[must_use]
    pub const fn new(policy: GuardPolicy, tokens: Arc<TokenService>) -> Self {
        Self { policy, tokens }
    }

    /// Decide what to do with a request for `path` carrying `headers`.
    #[must_use]
    pub fn evaluate(&self, path: &str, headers: &HeaderMap) -> GuardDecision {
        if !self.policy.requires_auth(path) {
            return GuardDecision::Allow;
        }

        let Some(token) = extract_session_token(headers) else {
            return GuardDecision::Redirect(RedirectReason::MissingToken);
        };

        match self.tokens.verify(&token) {
            Ok(claims) => GuardDecision::AllowAuthenticated(claims),
            Err(e) => GuardDecision::Redirect(RedirectReason::InvalidToken(e)),
        }
    }
}

/// Axum middleware enforcing the guard.
///
/// On success the verified [`SessionClaims`] are added to the request
/// extensions for downstream handlers.
pub async fn require_session(
    State(guard): State<Arc<Guard>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match guard.evaluate(&path, request.headers()) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::AllowAuthenticated(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        GuardDecision::Redirect(reason) => {
            tracing::debug!("redirecting {path} to {LOGIN_PATH}: {reason}");
            Redirect::temporary(LOGIN_PATH).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SESSION_COOKIE_NAME, SigningKey};
    use crate::time::ManualTimeSource;
    use axum::http::{HeaderValue, header::COOKIE};

    fn tokens(clock: &ManualTimeSource) -> Arc<TokenService> {
        let key = SigningKey::new(b"guard-test-secret".to_vec()).expect("non-empty key");
        Arc::new(TokenService::new(&key, Arc::new(clock.clone())))
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE_NAME}={token}")).expect("valid header"),
        );
        headers
    }

    #[test]
    fn test_allow_list_policy() {
        let policy = GuardPolicy::default();
        assert_eq!(policy.name(), "public-allow-list");
        for path in DEFAULT_PUBLIC_PATHS {
            assert!(!policy.requires_auth(path), "{path} should be public");
        }
        assert!(policy.requires_auth("/dashboard"));
        assert!(policy.requires_auth("/api/logout"));
        assert!(policy.requires_auth("/anything-else"));
        // Exact match only.
        assert!(policy.requires_auth("/login/extra"));
    }

    #[test]
    fn test_protected_prefix_policy() {
        let policy = GuardPolicy::protected_prefixes(DEFAULT_PROTECTED_PREFIXES);
        assert_eq!(policy.name(), "protected-prefixes");
        assert!(policy.requires_auth("/dashboard"));
        assert!(policy.requires_auth("/dashboard/"));
        assert!(policy.requires_auth("/dashboard/reports"));
        assert!(!policy.requires_auth("/dashboards"));
        assert!(!policy.requires_auth("/"));
        assert!(!policy.requires_auth("/api/logout"));
        assert!(!policy.requires_auth("/anything-else"));
    }

    #[test]
    fn test_policies_disagree_on_unlisted_paths() {
        let allow_list = GuardPolicy::default();
        let prefixes = GuardPolicy::protected_prefixes(DEFAULT_PROTECTED_PREFIXES);
        assert!(allow_list.requires_auth("/reports"));
        assert!(!prefixes.requires_auth("/reports"));
    }

    #[test]
    fn test_prefix_with_trailing_slash() {
        let policy = GuardPolicy::protected_prefixes(["/admin/"]);
        assert!(policy.requires_auth("/admin"));
        assert!(policy.requires_auth("/admin/users"));
        assert!(!policy.requires_auth("/administrator"));
    }

    #[test]
    fn test_public_path_skips_token_check() {
        let clock = ManualTimeSource::default_start();
        let guard = Guard::new(GuardPolicy::default(), tokens(&clock));

        assert_eq!(guard.evaluate("/login", &HeaderMap::new()), GuardDecision::Allow);
        assert_eq!(
            guard.evaluate("/api/login", &cookie_headers("garbage")),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_protected_path_without_cookie_redirects() {
        let clock = ManualTimeSource::default_start();
        let guard = Guard::new(GuardPolicy::default(), tokens(&clock));

        assert_eq!(
            guard.evaluate("/dashboard", &HeaderMap::new()),
            GuardDecision::Redirect(RedirectReason::MissingToken)
        );
    }

    #[test]
    fn test_protected_path_with_valid_token_allows() {
        let clock = ManualTimeSource::default_start();
        let tokens = tokens(&clock);
        let token = tokens.issue("user@example.com").expect("issue token");
        let guard = Guard::new(GuardPolicy::default(), tokens);

        match guard.evaluate("/dashboard", &cookie_headers(&token)) {
            GuardDecision::AllowAuthenticated(claims) => {
                assert_eq!(claims.email, "user@example.com");
            }
            other => panic!("expected AllowAuthenticated, got {other:?}"),
        }
    }

    #[test]
    fn test_protected_path_with_bad_tokens_redirects() {
        let clock = ManualTimeSource::default_start();
        let tokens = tokens(&clock);
        let token = tokens.issue("user@example.com").expect("issue token");
        let guard = Guard::new(GuardPolicy::default(), tokens);

        assert_eq!(
            guard.evaluate("/dashboard", &cookie_headers("not-a-jwt")),
            GuardDecision::Redirect(RedirectReason::InvalidToken(TokenError::Malformed))
        );

        clock.advance(TokenService::TOKEN_TTL_SECS);
        assert_eq!(
            guard.evaluate("/dashboard", &cookie_headers(&token)),
            GuardDecision::Redirect(RedirectReason::InvalidToken(TokenError::Expired))
        );
    }

    #[test]
    fn test_redirect_reason_display() {
        assert_eq!(RedirectReason::MissingToken.to_string(), "no session cookie");
        assert_eq!(
            RedirectReason::InvalidToken(TokenError::Expired).to_string(),
            "token verification failed: session token has expired"
        );
    }
}
