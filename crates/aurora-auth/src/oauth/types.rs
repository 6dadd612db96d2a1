//! Request and response types of the login flow.

use serde::{Deserialize, Serialize};

use crate::token::UserInfo;

/// Token endpoint response for a code exchange or a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: String,

    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: i64,

    /// Refresh token lifetime in seconds.
    #[serde(default)]
    pub refresh_expires_in: i64,

    #[serde(default)]
    pub token_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    #[serde(default)]
    pub scope: String,
}

/// Query parameters of `GET /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginParams {
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

/// Result of starting a login: where to send the user, and the state to expect back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub auth_url: String,
    pub state: String,
}

/// Query parameters the identity provider appends to the callback redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Tokens from a completed handshake plus the verified caller identity.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackResult {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub user: UserInfo,
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Body of `POST /auth/logout`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub redirect_uri: String,
}

/// Result of a logout: the provider's end-session URL to navigate to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub logout_url: String,
    pub message: String,
}

/// Public description of the auth setup, served at `GET /auth/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicAuthConfig {
    pub keycloak_url: String,
    pub keycloak_realm: String,
    pub keycloak_client_id: String,
    pub base_url: String,
    pub login_url: String,
    pub callback_url: String,
    pub refresh_url: String,
    pub logout_url: String,
    pub userinfo_url: String,
}

/// OpenID-style metadata describing this API's own auth endpoints,
/// served at `GET /.well-known/openid-configuration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub end_session_endpoint: String,
    pub jwks_uri: String,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub subject_types_supported: Vec<String>,
    pub id_token_signing_alg_values_supported: Vec<String>,
    pub scopes_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
}
