//! Credential check against the single configured identity.
//!
//! There is exactly one principal. A login attempt is accepted when both the
//! submitted email and password equal the configured values.

use serde::Deserialize;

/// Email of the built-in development identity.
pub const DEV_IDENTITY_EMAIL: &str = "user@example.com";
/// Password of the built-in development identity.
pub const DEV_IDENTITY_PASSWORD: &str = "secret123";

/// Where the configured identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// Supplied through the environment.
    Configured,
    /// The built-in development pair, explicitly enabled.
    DevelopmentFallback,
}

/// The single principal allowed to sign in.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// Login email, also the `email` claim of issued tokens.
    pub email: String,
    /// Plain-text password, compared exactly.
    pub password: String,
}

impl Identity {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// The built-in development identity. Only used when explicitly enabled.
    #[must_use]
    pub fn development() -> Self {
        Self::new(DEV_IDENTITY_EMAIL, DEV_IDENTITY_PASSWORD)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of a login request.
///
/// Both fields are optional so that a missing field is a rejected login
/// rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Compares submitted credentials with the configured identity.
#[derive(Debug, Clone)]
pub struct CredentialCheck {
    identity: Identity,
}

impl CredentialCheck {
    #[must_use]
    pub const fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// Exact string comparison on both fields.
    #[must_use]
    pub fn accepts(&self, email: &str, password: &str) -> bool {
        email == self.identity.email && password == self.identity.password
    }

    /// Check a login request body. Missing fields are rejected.
    ///
    /// Returns the accepted email on success.
    #[must_use]
    pub fn check_request<'a>(&self, request: &'a LoginRequest) -> Option<&'a str> {
        let email = request.email.as_deref()?;
        let password = request.password.as_deref()?;
        self.accepts(email, password).then_some(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check() -> CredentialCheck {
        CredentialCheck::new(Identity::new("admin@example.org", "hunter2"))
    }

    #[test]
    fn test_accepts_exact_match() {
        assert!(check().accepts("admin@example.org", "hunter2"));
    }

    #[test]
    fn test_rejects_wrong_password_or_email() {
        let check = check();
        assert!(!check.accepts("admin@example.org", "hunter3"));
        assert!(!check.accepts("other@example.org", "hunter2"));
        assert!(!check.accepts("", ""));
    }

    #[test]
    fn test_comparison_is_case_and_whitespace_sensitive() {
        let check = check();
        assert!(!check.accepts("Admin@example.org", "hunter2"));
        assert!(!check.accepts("admin@example.org ", "hunter2"));
        assert!(!check.accepts("admin@example.org", "HUNTER2"));
    }

    #[test]
    fn test_development_identity() {
        let check = CredentialCheck::new(Identity::development());
        assert!(check.accepts(DEV_IDENTITY_EMAIL, DEV_IDENTITY_PASSWORD));
    }

    #[test]
    fn test_check_request_missing_fields_rejected() {
        let check = check();
        let missing_password = LoginRequest {
            email: Some("admin@example.org".to_string()),
            password: None,
        };
        let missing_email = LoginRequest {
            email: None,
            password: Some("hunter2".to_string()),
        };

        assert_eq!(check.check_request(&missing_password), None);
        assert_eq!(check.check_request(&missing_email), None);
        assert_eq!(check.check_request(&LoginRequest::default()), None);
    }

    #[test]
    fn test_check_request_accepts_valid_body() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"admin@example.org","password":"hunter2"}"#)
                .expect("valid json");
        assert_eq!(check().check_request(&request), Some("admin@example.org"));
    }

    #[test]
    fn test_identity_debug_redacts_password() {
        let rendered = format!("{:?}", Identity::new("a@b.c", "hunter2"));
        assert!(rendered.contains("a@b.c"));
        assert!(!rendered.contains("hunter2"));
    }
}
