//! Authentication error types.
//!
//! [`AuthError`] is the umbrella error returned by the orchestrator, the
//! bearer extractor and the HTTP handlers. Component errors
//! ([`SessionError`], [`DiscoveryError`], [`TokenError`]) stay distinct
//! internally; their `Display` as an `AuthError` is deliberately generic so
//! session and token diagnostics never reach the client.

use crate::oidc::DiscoveryError;
use crate::session::SessionError;
use crate::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The discovery document could not be fetched or decoded.
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// A request to the identity provider failed at the transport level.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The token endpoint answered with a non-200 status.
    #[error("Token endpoint returned {status} during {operation}")]
    TokenEndpoint {
        /// `"code exchange"` or `"token refresh"`.
        operation: &'static str,
        /// HTTP status received.
        status: u16,
    },

    /// The token endpoint body could not be decoded.
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// A URL taken from the discovery document does not parse.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// No usable handshake session for the callback state.
    #[error("Invalid or expired session")]
    InvalidSession(SessionError),

    /// The bearer token failed verification.
    #[error("Invalid token")]
    InvalidToken(#[from] TokenError),

    /// No bearer token was presented.
    #[error("Missing bearer token")]
    MissingToken,

    /// The caller lacks a required role.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of the missing permission.
        message: String,
    },

    /// The identity provider redirected back with an error.
    #[error("Identity provider error: {error}")]
    IdentityProvider {
        /// OAuth2 error code from the callback.
        error: String,
        /// Optional human readable description.
        description: Option<String>,
    },

    /// The request is malformed (missing parameter, bad body).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what is wrong.
        message: String,
    },

    /// The discovery document lacks an endpoint the operation needs.
    #[error("Discovery document has no {0}")]
    MissingEndpoint(&'static str),

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Serialization(e) => Self::internal(format!("session serialization: {e}")),
            other => Self::InvalidSession(other),
        }
    }
}

impl AuthError {
    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `IdentityProvider` error.
    #[must_use]
    pub fn identity_provider(error: impl Into<String>, description: Option<String>) -> Self {
        Self::IdentityProvider {
            error: error.into(),
            description,
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` for errors the client caused with its request.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSession(_)
                | Self::IdentityProvider { .. }
                | Self::InvalidRequest { .. }
                | Self::InvalidToken(_)
                | Self::MissingToken
                | Self::Forbidden { .. }
        )
    }

    /// Returns `true` for bearer-token authentication failures.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::InvalidToken(_) | Self::MissingToken)
    }

    /// Returns `true` for failures talking to the identity provider.
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            Self::Discovery(_)
                | Self::Network(_)
                | Self::TokenEndpoint { .. }
                | Self::InvalidTokenResponse(_)
                | Self::MissingEndpoint(_)
        )
    }
}
