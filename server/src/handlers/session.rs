//! Login and logout endpoints.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::{LoginRequest, clear_session_cookie, session_cookie};

/// Message returned for a rejected login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "認証失敗";

/// JSON body of every login/logout response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SessionResponse {
    const fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

/// Handler-level failures.
#[derive(Debug)]
pub enum ApiError {
    /// Wrong, missing, or malformed credentials.
    InvalidCredentials,
    /// The server could not build a session.
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Internal(reason) => write!(f, "internal error: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_MESSAGE),
            Self::Internal(reason) => {
                tracing::error!("login failed: {reason}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };
        let body = SessionResponse {
            success: false,
            message: Some(message.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// `POST /api/login`
///
/// On success sets the session cookie. Any body that is not JSON with both
/// `email` and `password` is treated as a failed login.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("login rejected: unreadable body: {rejection}");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let Some(email) = state.credentials.check_request(&request) else {
        tracing::warn!(
            "login rejected for email {:?}",
            request.email.as_deref().unwrap_or_default()
        );
        return Err(ApiError::InvalidCredentials);
    };

    let token = state
        .tokens
        .issue(email)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let cookie = session_cookie(&token, state.cookie_secure)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!("login succeeded for {email}");
    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(SessionResponse::ok()),
    )
        .into_response())
}

/// `POST /api/logout`
///
/// Clears the cookie in this browser only. The token itself stays valid
/// until it expires.
pub async fn logout(State(state): State<AppState>) -> Response {
    match clear_session_cookie(state.cookie_secure) {
        Ok(cookie) => (
            StatusCode::OK,
            [(SET_COOKIE, cookie)],
            Json(SessionResponse::ok()),
        )
            .into_response(),
        Err(e) => ApiError::Internal(e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_body_has_no_message() {
        let json = serde_json::to_value(SessionResponse::ok()).expect("serialize");
        assert_eq!(json, serde_json::json!({ "success": true }));
    }

    #[test]
    fn test_invalid_credentials_response() {
        let response = ApiError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[test]
    fn test_internal_error_response() {
        let response = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(ApiError::InvalidCredentials.to_string(), "invalid credentials");
        assert_eq!(
            ApiError::Internal("boom".to_string()).to_string(),
            "internal error: boom"
        );
    }
}
