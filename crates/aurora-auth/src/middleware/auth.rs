//! Bearer token authentication extractor.
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use aurora_auth::middleware::BearerAuth;
//!
//! async fn whoami(BearerAuth(claims): BearerAuth) -> String {
//!     format!("Hello, {}!", claims.preferred_username)
//! }
//!
//! let app = Router::new()
//!     .route("/whoami", get(whoami))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::error::AuthError;
use crate::oauth::AuthService;
use crate::token::{Claims, TokenVerifier, extract_token_from_header};

/// Shared state of the auth handlers and the bearer extractor.
///
/// Include it in the application state and expose it through `FromRef`.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub service: Arc<AuthService>,
    pub verifier: Arc<TokenVerifier>,
}

impl AuthState {
    #[must_use]
    pub fn new(service: Arc<AuthService>) -> Self {
        let verifier = Arc::clone(service.verifier());
        Self { service, verifier }
    }
}

/// Verified claims of the request's bearer token.
///
/// Rejects with `MissingToken` when no `Authorization: Bearer` header is
/// present and with `InvalidToken` when verification fails; both render as
/// 401.
#[derive(Debug, Clone)]
pub struct BearerAuth(pub Claims);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let token = extract_token_from_header(header);
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = auth_state.verifier.validate_token(token).await.map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            AuthError::from(e)
        })?;

        Ok(Self(claims))
    }
}

/// Fails with `Forbidden` unless `claims` carry at least one of `roles`.
///
/// # Errors
///
/// Returns `AuthError::Forbidden` when no realm role matches.
pub fn require_any_role<S: AsRef<str>>(claims: &Claims, roles: &[S]) -> Result<(), AuthError> {
    if claims.has_any_role(roles) {
        return Ok(());
    }

    let wanted = roles
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    debug!(sub = %claims.sub, required = %wanted, "Missing required role");
    Err(AuthError::forbidden(format!(
        "requires one of roles: {wanted}"
    )))
}
