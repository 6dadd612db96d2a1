//! PKCE (RFC 7636) material for the login handshake.
//!
//! Only the S256 method is used. The verifier and the `state` token are
//! random bytes encoded as base64url without padding.
//!
//! ```
//! use aurora_auth::oauth::{PkceChallenge, PkceVerifier};
//!
//! let verifier = PkceVerifier::generate();
//! let challenge = PkceChallenge::from_verifier(&verifier);
//! assert!(challenge.matches(verifier.as_str()));
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes behind a `state` token.
pub const STATE_BYTES: usize = 32;

/// Random bytes behind a code verifier (86 base64url characters).
pub const VERIFIER_BYTES: usize = 64;

fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates an opaque anti-CSRF `state` token.
#[must_use]
pub fn generate_state() -> String {
    random_token(STATE_BYTES)
}

/// PKCE challenge method. S256 is the only one sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PkceChallengeMethod {
    #[default]
    S256,
}

impl PkceChallengeMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
        }
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PKCE code verifier. Secret; kept server-side in the handshake session.
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Generates a verifier from 64 random bytes.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_token(VERIFIER_BYTES))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// S256 code challenge: `BASE64URL(SHA256(ASCII(code_verifier)))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Derives the challenge for a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        Self::from_verifier_str(verifier.as_str())
    }

    /// Derives the challenge for a raw verifier string.
    #[must_use]
    pub fn from_verifier_str(verifier: &str) -> Self {
        let hash = Sha256::digest(verifier.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hash))
    }

    /// Returns `true` if `verifier` hashes to this challenge.
    #[must_use]
    pub fn matches(&self, verifier: &str) -> bool {
        Self::from_verifier_str(verifier) == *self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}
