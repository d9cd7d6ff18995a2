//! Session token issuance and verification.
//!
//! Tokens are HS256 JSON Web Tokens carrying the signed-in email plus `iat`
//! and `exp` claims. They live for [`TokenService::TOKEN_TTL_SECS`] seconds.
//!
//! # Pre-conditions
//! - The signing key is non-empty (enforced by [`SigningKey::new`]).
//!
//! # Post-conditions
//! - `issue` returns a token that `verify` accepts until `exp`.
//! - `verify` never panics; every failure is a [`TokenError`] value.
//!
//! # Invariants
//! - The service holds no per-token state. There is no revocation list, so
//!   a token stays valid until it expires even if the browser that held it
//!   logged out.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::time::TimeSource;

/// Error returned when a signing key cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningKeyError {
    /// The secret is empty.
    Empty,
}

impl std::fmt::Display for SigningKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "signing key must not be empty"),
        }
    }
}

impl std::error::Error for SigningKeyError {}

/// Shared HMAC-SHA256 secret used to sign and verify session tokens.
#[derive(Clone)]
pub struct SigningKey {
    secret: Vec<u8>,
}

impl SigningKey {
    /// Create a signing key.
    ///
    /// # Errors
    /// Returns `SigningKeyError::Empty` if `secret` is empty.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, SigningKeyError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SigningKeyError::Empty);
        }
        Ok(Self { secret })
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.secret.len())
            .finish_non_exhaustive()
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Email of the signed-in identity.
    pub email: String,
    /// Issued-at, seconds since Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since Unix epoch.
    pub exp: u64,
}

/// Error returned when issuing or verifying a token fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not a well-formed HS256 JWT with the expected claims.
    Malformed,
    /// The signature does not match the signing key.
    InvalidSignature,
    /// The token's `exp` has passed.
    Expired,
    /// The `email` claim is empty.
    MissingEmail,
    /// Signing a new token failed.
    Signing(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed session token"),
            Self::InvalidSignature => write!(f, "invalid session token signature"),
            Self::Expired => write!(f, "session token has expired"),
            Self::MissingEmail => write!(f, "missing 'email' claim in session token"),
            Self::Signing(reason) => write!(f, "failed to sign session token: {reason}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and verifies session tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn TimeSource>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    /// Lifetime of an issued token.
    pub const TOKEN_TTL_SECS: u64 = 60 * 60;

    /// Create a token service signing with `key` and reading time from `clock`.
    #[must_use]
    pub fn new(key: &SigningKey, clock: Arc<dyn TimeSource>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `clock`, not the system time.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(&key.secret),
            decoding_key: DecodingKey::from_secret(&key.secret),
            validation,
            clock,
        }
    }

    /// Issue a token asserting `email`, valid for one hour from now.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if the JWT cannot be encoded.
    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        let iat = self.clock.now_secs();
        let claims = SessionClaims {
            email: email.to_string(),
            iat,
            exp: iat.saturating_add(Self::TOKEN_TTL_SECS),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// A token is rejected once the current time reaches its `exp`.
    ///
    /// # Errors
    /// Returns a `TokenError` describing why the token was rejected.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;
        let claims = token_data.claims;

        if self.clock.now_secs() >= claims.exp {
            return Err(TokenError::Expired);
        }
        if claims.email.is_empty() {
            return Err(TokenError::MissingEmail);
        }

        Ok(claims)
    }
}

/// Maps jsonwebtoken errors to our `TokenError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
