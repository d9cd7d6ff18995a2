//! HTTP handlers: the JSON login/logout API and the HTML pages.

pub mod pages;
pub mod session;

pub use session::{ApiError, INVALID_CREDENTIALS_MESSAGE, SessionResponse};
