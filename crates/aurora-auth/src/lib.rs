//! Authentication core for the Aurora content API.
//!
//! Implements the OAuth2 Authorization Code flow with PKCE against a
//! Keycloak-style OpenID Connect realm:
//!
//! - [`session`]: short-lived, single-use handshake sessions and their background sweep
//! - [`oauth`]: PKCE material and the [`AuthService`] orchestrator
//! - [`oidc`]: discovery document client and provider health check
//! - [`token`]: JWKS-backed bearer token verification and typed [`Claims`]
//! - [`middleware`] / [`http`]: Axum extractor, error rendering and handlers
//!
//! The crate never builds its own HTTP client for provider calls; callers
//! inject a `reqwest::Client` configured with their timeout policy.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod oauth;
pub mod oidc;
pub mod session;
pub mod token;

pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use middleware::{AuthState, BearerAuth, require_any_role};
pub use oauth::{AuthService, TokenResponse};
pub use oidc::{DiscoveryClient, DiscoveryDocument, DiscoveryError};
pub use session::{AuthSession, SessionError, SessionStore, SessionSweeper};
pub use token::{Claims, TokenError, TokenVerifier, UserInfo, extract_token_from_header};

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
