//! Server configuration module.
//!
//! This module provides configuration loading for the portal server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `PORTAL_SECRET_KEY`: HMAC key used to sign session tokens (required)
//! - `PORTAL_IDENTITY_EMAIL` / `PORTAL_IDENTITY_PASSWORD`: the single login
//!   identity (required unless `PORTAL_ALLOW_DEV_IDENTITY` is enabled)
//! - `PORTAL_ALLOW_DEV_IDENTITY`: fall back to the built-in development
//!   identity when no identity is configured (default: `false`)
//! - `PORTAL_LISTEN_ADDR`: Address to bind (default: `127.0.0.1`)
//! - `PORTAL_LISTEN_PORT`: Port to listen on (default: `3000`)
//! - `PORTAL_GUARD_POLICY`: `public-allow-list` or `protected-prefixes`
//!   (default: `public-allow-list`)
//! - `PORTAL_GUARD_PATHS`: Comma-separated path list for the chosen policy
//!   (default: the policy's built-in list)
//! - `PORTAL_COOKIE_SECURE`: Mark the session cookie `Secure` (default: `false`)
//! - `PORTAL_DASHBOARD_EMBED_URL`: Page embedded on the dashboard (optional)
//!
//! # Invariants
//!
//! - `signing_key` is never empty
//! - `identity` comes from the environment unless the development fallback
//!   was explicitly enabled

use std::net::IpAddr;

use crate::auth::{Identity, IdentitySource, SigningKey};
use crate::guard::{DEFAULT_PROTECTED_PREFIXES, GuardPolicy, LOGIN_API_PATH, LOGIN_PATH};

const SECRET_KEY_VAR: &str = "PORTAL_SECRET_KEY";
const IDENTITY_EMAIL_VAR: &str = "PORTAL_IDENTITY_EMAIL";
const IDENTITY_PASSWORD_VAR: &str = "PORTAL_IDENTITY_PASSWORD";
const ALLOW_DEV_IDENTITY_VAR: &str = "PORTAL_ALLOW_DEV_IDENTITY";
const LISTEN_ADDR_VAR: &str = "PORTAL_LISTEN_ADDR";
const LISTEN_PORT_VAR: &str = "PORTAL_LISTEN_PORT";
const GUARD_POLICY_VAR: &str = "PORTAL_GUARD_POLICY";
const GUARD_PATHS_VAR: &str = "PORTAL_GUARD_PATHS";
const COOKIE_SECURE_VAR: &str = "PORTAL_COOKIE_SECURE";
const DASHBOARD_EMBED_URL_VAR: &str = "PORTAL_DASHBOARD_EMBED_URL";

/// Server configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()`, every field holds a validated value.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Key for signing and verifying session tokens.
    pub signing_key: SigningKey,
    /// The single identity allowed to log in.
    pub identity: Identity,
    /// Whether `identity` is configured or the development fallback.
    pub identity_source: IdentitySource,
    /// Address to bind.
    pub listen_addr: IpAddr,
    /// Port to listen on.
    pub listen_port: u16,
    /// Which paths require a session.
    pub guard_policy: GuardPolicy,
    /// Add the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,
    /// URL embedded in the dashboard page, if any.
    pub dashboard_embed_url: Option<String>,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 3000;
    /// Default bind address.
    pub const DEFAULT_LISTEN_ADDR: &'static str = "127.0.0.1";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `PORTAL_SECRET_KEY` is not set or is empty
    /// - no identity is configured and the development fallback is off
    /// - only one of the identity variables is set
    /// - any optional variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Unset variables return `None`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signing_key = Self::load_signing_key(&lookup)?;
        let (identity, identity_source) = Self::load_identity(&lookup)?;
        let listen_addr = Self::load_listen_addr(&lookup)?;
        let listen_port = Self::load_listen_port(&lookup)?;
        let guard_policy = Self::load_guard_policy(&lookup)?;
        let cookie_secure = parse_bool(COOKIE_SECURE_VAR, lookup(COOKIE_SECURE_VAR))?;
        let dashboard_embed_url = lookup(DASHBOARD_EMBED_URL_VAR)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Ok(Self {
            signing_key,
            identity,
            identity_source,
            listen_addr,
            listen_port,
            guard_policy,
            cookie_secure,
            dashboard_embed_url,
        })
    }

    fn load_signing_key(lookup: &impl Fn(&str) -> Option<String>) -> Result<SigningKey, ConfigError> {
        let secret =
            lookup(SECRET_KEY_VAR).ok_or_else(|| ConfigError::MissingEnvVar(SECRET_KEY_VAR.to_string()))?;
        SigningKey::new(secret).map_err(|e| ConfigError::invalid(SECRET_KEY_VAR, e.to_string()))
    }

    /// Load the login identity.
    ///
    /// Both variables must be set together. With neither set, the development
    /// identity is used only if `PORTAL_ALLOW_DEV_IDENTITY` is enabled.
    fn load_identity(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<(Identity, IdentitySource), ConfigError> {
        let email = lookup(IDENTITY_EMAIL_VAR).filter(|v| !v.is_empty());
        let password = lookup(IDENTITY_PASSWORD_VAR).filter(|v| !v.is_empty());

        match (email, password) {
            (Some(email), Some(password)) => {
                Ok((Identity::new(email, password), IdentitySource::Configured))
            }
            (Some(_), None) => Err(ConfigError::invalid(
                IDENTITY_PASSWORD_VAR,
                format!("must be set when {IDENTITY_EMAIL_VAR} is set"),
            )),
            (None, Some(_)) => Err(ConfigError::invalid(
                IDENTITY_EMAIL_VAR,
                format!("must be set when {IDENTITY_PASSWORD_VAR} is set"),
            )),
            (None, None) => {
                if parse_bool(ALLOW_DEV_IDENTITY_VAR, lookup(ALLOW_DEV_IDENTITY_VAR))? {
                    Ok((Identity::development(), IdentitySource::DevelopmentFallback))
                } else {
                    Err(ConfigError::MissingEnvVar(IDENTITY_EMAIL_VAR.to_string()))
                }
            }
        }
    }

    fn load_listen_addr(lookup: &impl Fn(&str) -> Option<String>) -> Result<IpAddr, ConfigError> {
        let value = lookup(LISTEN_ADDR_VAR).unwrap_or_else(|| Self::DEFAULT_LISTEN_ADDR.to_string());
        value
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::invalid(LISTEN_ADDR_VAR, format!("'{value}' is not a valid IP address")))
    }

    fn load_listen_port(lookup: &impl Fn(&str) -> Option<String>) -> Result<u16, ConfigError> {
        match lookup(LISTEN_PORT_VAR) {
            Some(value) => value
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| {
                    ConfigError::invalid(
                        LISTEN_PORT_VAR,
                        format!("'{value}' is not a valid port number (must be 1-65535)"),
                    )
                }),
            None => Ok(Self::DEFAULT_PORT),
        }
    }

    /// Load the guard policy.
    ///
    /// Rejected requests are redirected to the login page, so the login page
    /// and the login API must stay public under whatever paths are configured.
    fn load_guard_policy(lookup: &impl Fn(&str) -> Option<String>) -> Result<GuardPolicy, ConfigError> {
        let paths = lookup(GUARD_PATHS_VAR).map(|value| parse_path_list(&value)).transpose()?;

        let kind = lookup(GUARD_POLICY_VAR).unwrap_or_else(|| "public-allow-list".to_string());
        let policy = match kind.trim().to_ascii_lowercase().as_str() {
            "public-allow-list" => paths.map_or_else(GuardPolicy::default, GuardPolicy::public_allow_list),
            "protected-prefixes" => GuardPolicy::protected_prefixes(
                paths.unwrap_or_else(|| DEFAULT_PROTECTED_PREFIXES.map(String::from).to_vec()),
            ),
            _ => {
                return Err(ConfigError::invalid(
                    GUARD_POLICY_VAR,
                    format!("'{kind}' is not one of: public-allow-list, protected-prefixes"),
                ));
            }
        };

        if let Some(path) = [LOGIN_PATH, LOGIN_API_PATH]
            .into_iter()
            .find(|path| policy.requires_auth(path))
        {
            return Err(ConfigError::invalid(
                GUARD_PATHS_VAR,
                format!("'{path}' must stay public under the {} policy", policy.name()),
            ));
        }

        Ok(policy)
    }
}

/// Parse a comma-separated list of absolute paths.
fn parse_path_list(value: &str) -> Result<Vec<String>, ConfigError> {
    let paths: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    if paths.is_empty() {
        return Err(ConfigError::invalid(GUARD_PATHS_VAR, "must list at least one path"));
    }
    if let Some(bad) = paths.iter().find(|p| !p.starts_with('/')) {
        return Err(ConfigError::invalid(
            GUARD_PATHS_VAR,
            format!("'{bad}' must start with '/'"),
        ));
    }
    Ok(paths)
}

/// Parse an optional boolean flag. Unset means `false`.
fn parse_bool(name: &str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::invalid(name, format!("'{value}' is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const BASE: [(&str, &str); 3] = [
        ("PORTAL_SECRET_KEY", "top-secret"),
        ("PORTAL_IDENTITY_EMAIL", "admin@example.org"),
        ("PORTAL_IDENTITY_PASSWORD", "hunter2"),
    ];

    #[test]
    fn test_default_values() {
        assert_eq!(ServerConfig::DEFAULT_PORT, 3000);
        assert_eq!(ServerConfig::DEFAULT_LISTEN_ADDR, "127.0.0.1");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load(&BASE).expect("valid config");
        assert_eq!(config.identity, Identity::new("admin@example.org", "hunter2"));
        assert_eq!(config.identity_source, IdentitySource::Configured);
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1");
        assert_eq!(config.listen_port, 3000);
        assert_eq!(config.guard_policy, GuardPolicy::default());
        assert!(!config.cookie_secure);
        assert_eq!(config.dashboard_embed_url, None);
    }

    #[test]
    fn test_missing_secret_key_is_fatal() {
        let result = load(&BASE[1..]);
        assert_eq!(
            result.err(),
            Some(ConfigError::MissingEnvVar("PORTAL_SECRET_KEY".to_string()))
        );
    }

    #[test]
    fn test_empty_secret_key_is_invalid() {
        let mut vars = BASE.to_vec();
        vars[0] = ("PORTAL_SECRET_KEY", "");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue { name, .. }) if name == "PORTAL_SECRET_KEY"
        ));
    }

    #[test]
    fn test_missing_identity_without_dev_fallback() {
        let result = load(&[("PORTAL_SECRET_KEY", "top-secret")]);
        assert_eq!(
            result.err(),
            Some(ConfigError::MissingEnvVar("PORTAL_IDENTITY_EMAIL".to_string()))
        );
    }

    #[test]
    fn test_dev_identity_requires_opt_in() {
        let config = load(&[
            ("PORTAL_SECRET_KEY", "top-secret"),
            ("PORTAL_ALLOW_DEV_IDENTITY", "true"),
        ])
        .expect("valid config");
        assert_eq!(config.identity, Identity::development());
        assert_eq!(config.identity_source, IdentitySource::DevelopmentFallback);
    }

    #[test]
    fn test_configured_identity_wins_over_dev_fallback() {
        let mut vars = BASE.to_vec();
        vars.push(("PORTAL_ALLOW_DEV_IDENTITY", "1"));
        let config = load(&vars).expect("valid config");
        assert_eq!(config.identity_source, IdentitySource::Configured);
    }

    #[test]
    fn test_half_configured_identity_is_invalid() {
        let result = load(&[
            ("PORTAL_SECRET_KEY", "top-secret"),
            ("PORTAL_IDENTITY_EMAIL", "admin@example.org"),
            ("PORTAL_ALLOW_DEV_IDENTITY", "true"),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name, .. }) if name == "PORTAL_IDENTITY_PASSWORD"
        ));
    }

    #[test]
    fn test_invalid_port() {
        for port in ["abc", "0", "70000"] {
            let mut vars = BASE.to_vec();
            vars.push(("PORTAL_LISTEN_PORT", port));
            assert!(
                matches!(load(&vars), Err(ConfigError::InvalidValue { name, .. }) if name == "PORTAL_LISTEN_PORT"),
                "port {port} should be rejected"
            );
        }
    }

    #[test]
    fn test_listen_addr_and_port() {
        let mut vars = BASE.to_vec();
        vars.push(("PORTAL_LISTEN_ADDR", "0.0.0.0"));
        vars.push(("PORTAL_LISTEN_PORT", "8080"));
        let config = load(&vars).expect("valid config");
        assert_eq!(config.listen_addr.to_string(), "0.0.0.0");
        assert_eq!(config.listen_port, 8080);
    }

    #[test]
    fn test_protected_prefix_policy_defaults() {
        let mut vars = BASE.to_vec();
        vars.push(("PORTAL_GUARD_POLICY", "protected-prefixes"));
        let config = load(&vars).expect("valid config");
        assert_eq!(
            config.guard_policy,
            GuardPolicy::protected_prefixes(["/dashboard"])
        );
    }

    #[test]
    fn test_guard_paths_override() {
        let mut vars = BASE.to_vec();
        vars.push(("PORTAL_GUARD_PATHS", "/, /login, /api/login, /health"));
        let config = load(&vars).expect("valid config");
        assert_eq!(
            config.guard_policy,
            GuardPolicy::public_allow_list(["/", "/login", "/api/login", "/health"])
        );
    }

    #[test]
    fn test_guard_paths_must_be_absolute() {
        let mut vars = BASE.to_vec();
        vars.push(("PORTAL_GUARD_PATHS", "/login,dashboard"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue { name, .. }) if name == "PORTAL_GUARD_PATHS"
        ));
    }

    #[test]
    fn test_allow_list_must_keep_login_public() {
        for paths in ["/", "/, /login", "/, /api/login"] {
            let mut vars = BASE.to_vec();
            vars.push(("PORTAL_GUARD_PATHS", paths));
            assert!(
                matches!(load(&vars), Err(ConfigError::InvalidValue { name, .. }) if name == "PORTAL_GUARD_PATHS"),
                "paths {paths} should be rejected"
            );
        }
    }

    #[test]
    fn test_protected_prefixes_must_not_cover_login() {
        for paths in ["/", "/dashboard, /login", "/api"] {
            let mut vars = BASE.to_vec();
            vars.push(("PORTAL_GUARD_POLICY", "protected-prefixes"));
            vars.push(("PORTAL_GUARD_PATHS", paths));
            assert!(
                matches!(load(&vars), Err(ConfigError::InvalidValue { name, .. }) if name == "PORTAL_GUARD_PATHS"),
                "prefixes {paths} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_guard_policy() {
        let mut vars = BASE.to_vec();
        vars.push(("PORTAL_GUARD_POLICY", "everything"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue { name, .. }) if name == "PORTAL_GUARD_POLICY"
        ));
    }

    #[test]
    fn test_cookie_secure_and_embed_url() {
        let mut vars = BASE.to_vec();
        vars.push(("PORTAL_COOKIE_SECURE", "Yes"));
        vars.push(("PORTAL_DASHBOARD_EMBED_URL", " https://analytics.example.com/embed "));
        let config = load(&vars).expect("valid config");
        assert!(config.cookie_secure);
        assert_eq!(
            config.dashboard_embed_url.as_deref(),
            Some("https://analytics.example.com/embed")
        );
    }

    #[test]
    fn test_invalid_boolean() {
        let mut vars = BASE.to_vec();
        vars.push(("PORTAL_COOKIE_SECURE", "maybe"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue { name, .. }) if name == "PORTAL_COOKIE_SECURE"
        ));
    }

    #[test]
    fn test_config_error_display_missing() {
        let error = ConfigError::MissingEnvVar("TEST_VAR".to_string());
        assert_eq!(
            error.to_string(),
            "missing required environment variable: TEST_VAR"
        );
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
