// Life of a request:
// 1. The guard middleware checks the path against the configured policy.
// 2. Protected paths need an `auth` cookie holding a token that verifies;
//    otherwise the browser is redirected to /login.
// 3. For POST /api/login:
//     - Compare the submitted credentials with the configured identity
//     - Issue a signed token and set it as the session cookie
//    For POST /api/logout:
//     - Expire the session cookie
//
// System components:
//  - Token service (HS256 JWT, one hour lifetime)
//  - Credential check (single identity)
//  - Route guard (axum middleware)

pub mod app;
pub mod auth;
pub mod config;
pub mod guard;
pub mod handlers;
pub mod time;

mod e2e_tests;

pub use app::{AppState, router};
