//! Authorization Code + PKCE orchestration against the identity provider.
//!
//! One login handshake moves through these steps:
//!
//! 1. [`AuthService::initiate_login`] creates the PKCE pair and `state`, and
//!    builds the authorization URL. The caller stores the returned session
//!    (or uses [`AuthService::start_login`], which does both).
//! 2. The identity provider redirects back with `code` and `state`.
//!    [`AuthService::handle_callback`] consumes the session exactly once.
//! 3. The code is exchanged at the token endpoint and the access token is
//!    verified before tokens and caller identity are returned.
//!
//! Refresh and logout are stateless and involve no session.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use super::pkce::{PkceChallenge, PkceChallengeMethod, PkceVerifier, generate_state};
use super::types::{
    CallbackParams, CallbackResult, DiscoveryMetadata, LoginResponse, LogoutRequest,
    LogoutResponse, PublicAuthConfig, TokenResponse,
};
use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::oidc::{DiscoveryClient, DiscoveryDocument, ProviderHealth, check_provider};
use crate::session::{AuthSession, SessionStore};
use crate::token::TokenVerifier;

/// Scopes requested on every login.
pub const LOGIN_SCOPE: &str = "openid profile email roles";

/// Message returned on logout.
pub const LOGOUT_MESSAGE: &str = "User logged out successfully";

/// Drives the OAuth2 login flow for one realm and client.
#[derive(Debug)]
pub struct AuthService {
    config: AuthConfig,
    http: reqwest::Client,
    discovery: DiscoveryClient,
    sessions: Arc<SessionStore>,
    verifier: Arc<TokenVerifier>,
}

impl AuthService {
    /// Creates the service. `http` carries the caller's timeout policy and is
    /// used for every identity-provider request.
    #[must_use]
    pub fn new(
        config: AuthConfig,
        http: reqwest::Client,
        sessions: Arc<SessionStore>,
        verifier: Arc<TokenVerifier>,
    ) -> Self {
        let discovery = DiscoveryClient::new(http.clone(), config.discovery_url())
            .with_ttl(config.discovery_cache_ttl);
        Self {
            config,
            http,
            discovery,
            sessions,
            verifier,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    #[must_use]
    pub fn verifier(&self) -> &Arc<TokenVerifier> {
        &self.verifier
    }

    /// Fetches the identity provider's discovery document.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Discovery` if it cannot be fetched or decoded.
    pub async fn discovery(&self) -> AuthResult<Arc<DiscoveryDocument>> {
        Ok(self.discovery.get().await?)
    }

    /// Starts a login handshake.
    ///
    /// Returns the authorization URL and `state` for the caller, plus the
    /// session to store. An empty or absent `redirect_uri` resolves to the
    /// configured default.
    ///
    /// # Errors
    ///
    /// Fails if discovery fails or the authorization endpoint is not a URL.
    pub async fn initiate_login(
        &self,
        redirect_uri: Option<&str>,
    ) -> AuthResult<(LoginResponse, AuthSession)> {
        let redirect_uri = self.resolve_redirect_uri(redirect_uri);

        let state = generate_state();
        let verifier = PkceVerifier::generate();
        let challenge = PkceChallenge::from_verifier(&verifier);

        let discovery = self.discovery().await?;

        let mut auth_url = Url::parse(&discovery.authorization_endpoint)?;
        auth_url
            .query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", LOGIN_SCOPE)
            .append_pair("redirect_uri", &redirect_uri)
            .append_pair("state", &state)
            .append_pair("code_challenge", challenge.as_str())
            .append_pair("code_challenge_method", PkceChallengeMethod::S256.as_str());

        let session = AuthSession::new(
            state.clone(),
            verifier.into_inner(),
            challenge.into_inner(),
            redirect_uri,
        );

        debug!(state = %state, redirect_uri = %session.redirect_uri, "Login initiated");

        Ok((
            LoginResponse {
                auth_url: auth_url.into(),
                state,
            },
            session,
        ))
    }

    /// Starts a login handshake and stores its session.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::initiate_login`].
    pub async fn start_login(&self, redirect_uri: Option<&str>) -> AuthResult<LoginResponse> {
        let (response, session) = self.initiate_login(redirect_uri).await?;
        self.sessions.store(session);
        Ok(response)
    }

    /// Completes a handshake from the identity provider's redirect.
    ///
    /// # Errors
    ///
    /// - `IdentityProvider` if the redirect carries an `error`; nothing else is attempted
    /// - `InvalidRequest` if `code` or `state` is missing
    /// - `InvalidSession` if no live session matches `state`
    /// - token endpoint errors from the exchange
    /// - `InvalidToken` if the issued access token does not verify
    pub async fn handle_callback(&self, params: CallbackParams) -> AuthResult<CallbackResult> {
        if let Some(error) = params.error.filter(|e| !e.is_empty()) {
            info!(
                error = %error,
                description = params.error_description.as_deref().unwrap_or_default(),
                "Identity provider returned an error on callback"
            );
            return Err(AuthError::identity_provider(
                error,
                params.error_description,
            ));
        }

        let (Some(code), Some(state)) = (
            params.code.filter(|c| !c.is_empty()),
            params.state.filter(|s| !s.is_empty()),
        ) else {
            return Err(AuthError::invalid_request("Missing code or state"));
        };

        let session = self.sessions.validate_and_consume(&state).map_err(|e| {
            info!(error = %e, "Failed to validate auth session");
            AuthError::from(e)
        })?;

        let tokens = self.exchange_code_for_tokens(&code, &session).await?;

        let claims = self
            .verifier
            .validate_token(&tokens.access_token)
            .await
            .map_err(|e| {
                warn!(error = %e, "Issued access token failed verification");
                AuthError::from(e)
            })?;

        info!(sub = %claims.sub, "Login completed");

        Ok(CallbackResult {
            user: claims.user_info(),
            tokens,
        })
    }

    /// Exchanges an authorization code using the session's PKCE verifier and
    /// redirect URI.
    ///
    /// # Errors
    ///
    /// Fails on discovery failure, transport failure, any status other than
    /// 200, or an undecodable body.
    pub async fn exchange_code_for_tokens(
        &self,
        code: &str,
        session: &AuthSession,
    ) -> AuthResult<TokenResponse> {
        self.post_token_form(
            "code exchange",
            &[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", session.redirect_uri.as_str()),
                ("code_verifier", session.code_verifier.as_str()),
            ],
        )
        .await
    }

    /// Obtains fresh tokens with a refresh token.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::exchange_code_for_tokens`].
    pub async fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        self.post_token_form(
            "token refresh",
            &[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ],
        )
        .await
    }

    /// Revokes the refresh token (best effort) and builds the end-session URL.
    ///
    /// Revocation failures are logged and ignored.
    ///
    /// # Errors
    ///
    /// Fails only if discovery fails or the end-session endpoint is missing
    /// or not a URL.
    pub async fn logout(&self, request: LogoutRequest) -> AuthResult<LogoutResponse> {
        let discovery = self.discovery().await?;

        match discovery.revocation_endpoint.as_deref() {
            Some(endpoint) if !request.refresh_token.is_empty() => {
                self.revoke_refresh_token(endpoint, &request.refresh_token)
                    .await;
            }
            Some(_) => debug!("No refresh token supplied; skipping revocation"),
            None => debug!("Identity provider has no revocation endpoint"),
        }

        let end_session = discovery
            .end_session_endpoint
            .as_deref()
            .ok_or(AuthError::MissingEndpoint("end_session_endpoint"))?;

        let redirect_uri = self.resolve_redirect_uri(Some(&request.redirect_uri));
        let mut logout_url = Url::parse(end_session)?;
        logout_url
            .query_pairs_mut()
            .append_pair("redirect_uri", &redirect_uri);

        Ok(LogoutResponse {
            logout_url: logout_url.into(),
            message: LOGOUT_MESSAGE.to_string(),
        })
    }

    /// Public description of this API's auth endpoints.
    #[must_use]
    pub fn auth_config(&self) -> PublicAuthConfig {
        PublicAuthConfig {
            keycloak_url: self.config.keycloak_url.clone(),
            keycloak_realm: self.config.realm.clone(),
            keycloak_client_id: self.config.client_id.clone(),
            base_url: self.config.base_url.clone(),
            login_url: self.config.local_url("/auth/login"),
            callback_url: self.config.local_url("/auth/callback"),
            refresh_url: self.config.local_url("/auth/refresh"),
            logout_url: self.config.local_url("/auth/logout"),
            userinfo_url: self.config.local_url("/auth/userinfo"),
        }
    }

    /// OpenID-style metadata pointing clients at this API's auth endpoints.
    #[must_use]
    pub fn discovery_config(&self) -> DiscoveryMetadata {
        let strings = |items: &[&str]| -> Vec<String> { items.iter().map(ToString::to_string).collect() };
        DiscoveryMetadata {
            issuer: self.config.issuer(),
            authorization_endpoint: self.config.local_url("/auth/login"),
            token_endpoint: self.config.local_url("/auth/callback"),
            userinfo_endpoint: self.config.local_url("/auth/userinfo"),
            end_session_endpoint: self.config.local_url("/auth/logout"),
            jwks_uri: self.config.jwks_uri(),
            response_types_supported: strings(&["code"]),
            grant_types_supported: strings(&["authorization_code", "refresh_token"]),
            subject_types_supported: strings(&["public"]),
            id_token_signing_alg_values_supported: strings(&["RS256"]),
            scopes_supported: strings(&["openid", "profile", "email", "roles"]),
            code_challenge_methods_supported: strings(&[PkceChallengeMethod::S256.as_str()]),
        }
    }

    /// Checks the identity provider with this service's HTTP client.
    pub async fn provider_health(&self) -> ProviderHealth {
        check_provider(&self.http, &self.config).await
    }

    fn resolve_redirect_uri(&self, requested: Option<&str>) -> String {
        match requested {
            Some(uri) if !uri.is_empty() => uri.to_string(),
            _ => self.config.fallback_redirect_uri(),
        }
    }

    async fn revoke_refresh_token(&self, endpoint: &str, refresh_token: &str) {
        let result = self
            .http
            .post(endpoint)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("token", refresh_token),
                ("token_type_hint", "refresh_token"),
            ])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Refresh token revoked");
            }
            Ok(response) => {
                warn!(status = response.status().as_u16(), "Token revocation rejected");
            }
            Err(e) => {
                warn!(error = %e, "Token revocation failed");
            }
        }
    }

    async fn post_token_form(
        &self,
        operation: &'static str,
        form: &[(&str, &str)],
    ) -> AuthResult<TokenResponse> {
        let discovery = self.discovery().await?;

        let response = self
            .http
            .post(&discovery.token_endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                warn!(operation, error = %e, "Token endpoint request failed");
                AuthError::Network(e)
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(operation, status = status.as_u16(), "Token endpoint returned error status");
            return Err(AuthError::TokenEndpoint {
                operation,
                status: status.as_u16(),
            });
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            warn!(operation, error = %e, "Failed to decode token response");
            AuthError::InvalidTokenResponse(e.to_string())
        })
    }
}
