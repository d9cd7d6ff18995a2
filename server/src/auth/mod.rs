//! Authentication module.
//!
//! Provides the credential check, session token service, and session cookie
//! helpers used by the login endpoints and the route guard.
//!
//! # Post-conditions
//! - Authentication configuration is immutable once loaded.
//!
//! # Invariants
//! - The server keeps no session table; the signed cookie is the session.

pub mod cookie;
pub mod credentials;
pub mod token;

pub use cookie::{
    SESSION_COOKIE_MAX_AGE_SECS, SESSION_COOKIE_NAME, clear_session_cookie,
    extract_session_token, session_cookie,
};
pub use credentials::{CredentialCheck, Identity, IdentitySource, LoginRequest};
pub use token::{SessionClaims, SigningKey, SigningKeyError, TokenError, TokenService};
