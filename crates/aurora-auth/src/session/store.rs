//! In-memory handshake session store.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use super::{AuthSession, SessionError, now_unix};

/// Default lifetime of a pending login handshake (5 minutes).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);

/// Shared map of pending login handshakes keyed by `state`.
///
/// A single reader/writer lock guards the map. [`SessionStore::get`] takes the
/// read lock; every mutation takes the write lock. [`SessionStore::validate_and_consume`]
/// holds the write lock across lookup and removal, so concurrent callers racing
/// on the same state see exactly one success.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, AuthSession>>,
    ttl_secs: i64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    /// Creates an empty store whose sessions expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Session lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.unsigned_abs())
    }

    /// Inserts a session, replacing any existing entry with the same state.
    pub fn store(&self, session: AuthSession) {
        debug!(state = %session.state, "Storing auth session");
        self.sessions.write().insert(session.state.clone(), session);
    }

    /// Returns a copy of the session for `state`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no session exists, `Expired` if it is older than the TTL.
    pub fn get(&self, state: &str) -> Result<AuthSession, SessionError> {
        self.get_at(state, now_unix())
    }

    pub(crate) fn get_at(&self, state: &str, now: i64) -> Result<AuthSession, SessionError> {
        let sessions = self.sessions.read();
        let session = sessions
            .get(state)
            .ok_or_else(|| SessionError::NotFound(state.to_string()))?;

        if self.is_expired(session, now) {
            return Err(SessionError::Expired(state.to_string()));
        }

        Ok(session.clone())
    }

    /// Removes the session for `state`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no session exists.
    pub fn delete(&self, state: &str) -> Result<(), SessionError> {
        self.sessions
            .write()
            .remove(state)
            .map(|_| ())
            .ok_or_else(|| SessionError::NotFound(state.to_string()))
    }

    /// Looks up and removes the session for `state` under one write lock.
    ///
    /// An expired entry is removed as well, so a retry with the same state
    /// reports `NotFound`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no session exists, `Expired` if it is older than the TTL.
    pub fn validate_and_consume(&self, state: &str) -> Result<AuthSession, SessionError> {
        self.validate_and_consume_at(state, now_unix())
    }

    pub(crate) fn validate_and_consume_at(
        &self,
        state: &str,
        now: i64,
    ) -> Result<AuthSession, SessionError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .remove(state)
            .ok_or_else(|| SessionError::NotFound(state.to_string()))?;

        if self.is_expired(&session, now) {
            debug!(state = %state, age_secs = session.age_at(now), "Auth session expired");
            return Err(SessionError::Expired(state.to_string()));
        }

        Ok(session)
    }

    /// Drops every session older than the TTL. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(now_unix())
    }

    pub(crate) fn purge_expired_at(&self, now: i64) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        before - sessions.len()
    }

    /// Number of stored sessions, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn is_expired(&self, session: &AuthSession, now: i64) -> bool {
        session.age_at(now) > self.ttl_secs
    }
}
