//! HTTP endpoints of the auth subsystem.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET  | `/auth/login` | [`login_handler`] |
//! | GET  | `/auth/callback` | [`callback_handler`] |
//! | POST | `/auth/refresh` | [`refresh_handler`] |
//! | POST | `/auth/logout` | [`logout_handler`] (bearer) |
//! | GET  | `/auth/userinfo` | [`userinfo_handler`] (bearer) |
//! | GET  | `/auth/config` | [`auth_config_handler`] |
//! | GET  | `/auth/health` | [`health_handler`] |
//! | GET  | `/auth/.well-known/openid-configuration` | [`discovery_handler`] |
//! | GET  | `/.well-known/openid-configuration` | [`discovery_handler`] |

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::middleware::{AuthState, BearerAuth};
use crate::oauth::{
    CallbackParams, CallbackResult, DiscoveryMetadata, LoginParams, LoginResponse, LogoutRequest,
    LogoutResponse, PublicAuthConfig, RefreshTokenRequest, TokenResponse,
};
use crate::token::UserInfo;

/// Builds the auth router.
pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/login", get(login_handler))
        .route("/auth/callback", get(callback_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/userinfo", get(userinfo_handler))
        .route("/auth/config", get(auth_config_handler))
        .route("/auth/health", get(health_handler))
        .route("/auth/.well-known/openid-configuration", get(discovery_handler))
        .route("/.well-known/openid-configuration", get(discovery_handler))
        .with_state(state)
}

/// Starts a login and returns the authorization URL to send the user to.
pub async fn login_handler(
    State(state): State<AuthState>,
    Query(params): Query<LoginParams>,
) -> Result<Json<LoginResponse>, AuthError> {
    let response = state
        .service
        .start_login(params.redirect_uri.as_deref())
        .await?;
    Ok(Json(response))
}

/// Completes a login from the identity provider's redirect.
pub async fn callback_handler(
    State(state): State<AuthState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<CallbackResult>, AuthError> {
    Ok(Json(state.service.handle_callback(params).await?))
}

pub async fn refresh_handler(
    State(state): State<AuthState>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Json(request) = payload.map_err(|e| {
        debug!(error = %e, "Invalid refresh request body");
        AuthError::invalid_request("Invalid request body")
    })?;
    Ok(Json(state.service.refresh_token(&request.refresh_token).await?))
}

/// Revokes the refresh token and returns the provider's logout URL.
/// Requires a valid bearer token.
pub async fn logout_handler(
    State(state): State<AuthState>,
    BearerAuth(claims): BearerAuth,
    payload: Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<Json<LogoutResponse>, AuthError> {
    let Json(request) = payload.map_err(|e| {
        debug!(error = %e, "Invalid logout request body");
        AuthError::invalid_request("Invalid request body")
    })?;
    let response = state.service.logout(request).await.inspect_err(|e| {
        warn!(error = %e, sub = %claims.sub, "Logout failed");
    })?;
    debug!(sub = %claims.sub, "User logged out");
    Ok(Json(response))
}

/// Identity of the bearer-token holder.
pub async fn userinfo_handler(BearerAuth(claims): BearerAuth) -> Json<UserInfo> {
    Json(claims.user_info())
}

pub async fn auth_config_handler(State(state): State<AuthState>) -> Json<PublicAuthConfig> {
    Json(state.service.auth_config())
}

/// Identity provider reachability; 503 when it is down.
pub async fn health_handler(State(state): State<AuthState>) -> Response {
    let health = state.service.provider_health().await;
    let status = if health.is_up() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health)).into_response()
}

pub async fn discovery_handler(State(state): State<AuthState>) -> Json<DiscoveryMetadata> {
    Json(state.service.discovery_config())
}
