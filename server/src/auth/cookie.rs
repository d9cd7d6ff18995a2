//! Session cookie handling.
//!
//! The session token travels in a single `auth` cookie. Login sets it,
//! logout replaces it with an empty, already-expired cookie.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};

use super::TokenService;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "auth";
/// Browser-side lifetime of the session cookie. Matches the token lifetime.
pub const SESSION_COOKIE_MAX_AGE_SECS: u64 = TokenService::TOKEN_TTL_SECS;

/// Build the `Set-Cookie` value carrying `token`.
pub fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; Max-Age={SESSION_COOKIE_MAX_AGE_SECS}; HttpOnly; SameSite=Lax"
    );
    // Only mark cookies secure when the site is served over HTTPS.
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that deletes the session cookie.
pub fn clear_session_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read the session token from the request's `Cookie` headers.
///
/// Returns `None` when the cookie is absent, empty, or not valid UTF-8.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == SESSION_COOKIE_NAME).then(|| val.trim().to_string())
        })
        .filter(|token| !token.is_empty())
}
