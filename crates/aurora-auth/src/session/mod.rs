//! Login handshake sessions.
//!
//! An [`AuthSession`] carries the PKCE material and redirect URI between the
//! "initiate login" and "handle callback" steps of the authorization code
//! flow. Sessions live only in memory, keyed by their `state` token.
//!
//! # Lifecycle
//!
//! 1. Created by [`AuthService::initiate_login`](crate::oauth::AuthService::initiate_login)
//! 2. Stored in the [`SessionStore`]
//! 3. Consumed exactly once on callback via [`SessionStore::validate_and_consume`]
//! 4. Or dropped by the [`SessionSweeper`] once older than the TTL

pub mod store;
pub mod sweeper;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use store::{DEFAULT_SESSION_TTL, SessionStore};
pub use sweeper::{DEFAULT_SWEEP_INTERVAL, MIN_SWEEP_INTERVAL, SessionSweeper};

/// Ephemeral state of one login handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Opaque anti-CSRF token, also the store key.
    pub state: String,

    /// PKCE code verifier. Secret; never sent anywhere but the token endpoint.
    pub code_verifier: String,

    /// PKCE S256 challenge derived from the verifier.
    pub code_challenge: String,

    /// Callback URL bound to this handshake.
    pub redirect_uri: String,

    /// Creation time (unix seconds).
    #[serde(rename = "timestamp")]
    pub created_at: i64,
}

impl AuthSession {
    /// Creates a session stamped with the current time.
    #[must_use]
    pub fn new(
        state: impl Into<String>,
        code_verifier: impl Into<String>,
        code_challenge: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            state: state.into(),
            code_verifier: code_verifier.into(),
            code_challenge: code_challenge.into(),
            redirect_uri: redirect_uri.into(),
            created_at: now_unix(),
        }
    }

    /// Age of the session in seconds at `now`.
    #[must_use]
    pub fn age_at(&self, now: i64) -> i64 {
        now - self.created_at
    }

    /// Serializes the session for hand-off across process boundaries.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(SessionError::from)
    }

    /// Parses a session produced by [`AuthSession::to_json`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Serialization` if the input is not a valid session.
    pub fn from_json(data: &str) -> Result<Self, SessionError> {
        serde_json::from_str(data).map_err(SessionError::from)
    }
}

/// Errors raised by the session store.
///
/// `NotFound` and `Expired` are kept apart for diagnostics only; callers
/// outside the crate see a single "invalid or expired session" condition.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the state.
    #[error("session not found for state: {0}")]
    NotFound(String),

    /// The session exists but is older than the TTL.
    #[error("session expired for state: {0}")]
    Expired(String),

    /// Session (de)serialization failed.
    #[error("session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// Returns `true` for the "no usable session" conditions.
    #[must_use]
    pub fn is_invalid_session(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Expired(_))
    }
}

pub(crate) fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
