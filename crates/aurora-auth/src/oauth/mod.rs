//! OAuth2 Authorization Code + PKCE client flow.

pub mod pkce;
pub mod service;
pub mod types;

pub use pkce::{PkceChallenge, PkceChallengeMethod, PkceVerifier, generate_state};
pub use service::{AuthService, LOGIN_SCOPE, LOGOUT_MESSAGE};
pub use types::{
    CallbackParams, CallbackResult, DiscoveryMetadata, LoginParams, LoginResponse, LogoutRequest,
    LogoutResponse, PublicAuthConfig, RefreshTokenRequest, TokenResponse,
};
