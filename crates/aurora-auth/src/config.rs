//! Authentication configuration.
//!
//! The auth subsystem talks to a single Keycloak-style OpenID Connect realm.
//! Every endpoint it needs is derived from `keycloak_url` + `realm`, either
//! directly (discovery document, JWKS) or through the discovery document.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// keycloak_url = "https://sso.example.com"
/// realm = "aurora"
/// client_id = "aurora-api"
/// client_secret = "change-me"
/// base_url = "https://api.example.com"
/// session_ttl = "5m"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the identity provider (without the `/realms/...` suffix).
    pub keycloak_url: String,

    /// Realm name on the identity provider.
    pub realm: String,

    /// OAuth2 client identifier registered at the identity provider.
    pub client_id: String,

    /// OAuth2 client secret (confidential client).
    pub client_secret: String,

    /// Redirect URI used when a login request does not name one.
    pub default_redirect_uri: String,

    /// Public base URL of this API, used to build self-referencing URLs.
    pub base_url: String,

    /// Lifetime of a pending login handshake.
    #[serde(with = "humantime_serde")]
    pub session_ttl: Duration,

    /// Interval of the background sweep that drops abandoned handshakes.
    #[serde(with = "humantime_serde")]
    pub session_sweep_interval: Duration,

    /// How long a fetched discovery document may be reused.
    /// Zero disables caching and every operation re-fetches the document.
    #[serde(with = "humantime_serde")]
    pub discovery_cache_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            keycloak_url: "http://localhost:8180".to_string(),
            realm: "aurora".to_string(),
            client_id: "aurora-api".to_string(),
            client_secret: String::new(),
            default_redirect_uri: String::new(),
            base_url: "http://localhost:8080".to_string(),
            session_ttl: Duration::from_secs(300),
            session_sweep_interval: Duration::from_secs(60),
            discovery_cache_ttl: Duration::ZERO,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required value is empty, a URL does not
    /// parse, or a duration is zero where it must not be.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keycloak_url.is_empty() {
            return Err(ConfigError::Missing("keycloak_url".to_string()));
        }
        Url::parse(&self.keycloak_url).map_err(|e| {
            ConfigError::InvalidValue(format!("keycloak_url '{}': {}", self.keycloak_url, e))
        })?;

        if self.realm.is_empty() {
            return Err(ConfigError::Missing("realm".to_string()));
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::Missing("client_id".to_string()));
        }

        if self.base_url.is_empty() {
            return Err(ConfigError::Missing("base_url".to_string()));
        }
        Url::parse(&self.base_url).map_err(|e| {
            ConfigError::InvalidValue(format!("base_url '{}': {}", self.base_url, e))
        })?;

        if !self.default_redirect_uri.is_empty() {
            Url::parse(&self.default_redirect_uri).map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "default_redirect_uri '{}': {}",
                    self.default_redirect_uri, e
                ))
            })?;
        }

        if self.session_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "session_ttl must be > 0".to_string(),
            ));
        }
        if self.session_sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "session_sweep_interval must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Issuer URL of the realm: `{keycloak_url}/realms/{realm}`.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!(
            "{}/realms/{}",
            self.keycloak_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Location of the realm's OpenID Connect discovery document.
    #[must_use]
    pub fn discovery_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.issuer())
    }

    /// Location of the realm's JSON Web Key Set.
    #[must_use]
    pub fn jwks_uri(&self) -> String {
        format!("{}/protocol/openid-connect/certs", self.issuer())
    }

    /// Builds `{base_url}{path}`.
    #[must_use]
    pub fn local_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Redirect URI used when the caller does not supply one.
    ///
    /// Falls back to this API's own `/auth/callback` when no default is configured.
    #[must_use]
    pub fn fallback_redirect_uri(&self) -> String {
        if self.default_redirect_uri.is_empty() {
            self.local_url("/auth/callback")
        } else {
            self.default_redirect_uri.clone()
        }
    }
}
