//! Bearer token verification against the realm's signing key.
//!
//! The verification key is fetched from the JWKS endpoint on first use and
//! kept for the life of the verifier. Concurrent first callers share a single
//! fetch. There is no refresh path: if the identity provider rotates its key,
//! tokens signed with the new key are rejected until the process restarts.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::claims::Claims;
use super::jwks::Jwks;
use crate::session::now_unix;

const BEARER_PREFIX: &str = "Bearer ";

/// Errors raised while verifying a bearer token.
///
/// Every variant fails closed. Callers outside the crate only see
/// "invalid token".
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The JWKS endpoint could not be reached or answered with an error.
    #[error("failed to fetch JWKS: {0}")]
    JwksFetch(String),

    /// The JWKS body is not a key set.
    #[error("failed to decode JWKS: {0}")]
    JwksDecode(String),

    /// The key set is empty.
    #[error("no keys found in JWKS")]
    NoKeys,

    /// The first key cannot be turned into an RSA public key.
    #[error("failed to convert JWK to RSA public key: {0}")]
    InvalidKey(String),

    /// The token is signed with something other than RS256/RS384/RS512.
    #[error("unexpected signing method: {0}")]
    UnexpectedAlgorithm(String),

    /// The signature does not verify against the cached key.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's `exp` is not in the future.
    #[error("token expired")]
    Expired,

    /// The token cannot be parsed.
    #[error("malformed token: {0}")]
    Malformed(String),
}

impl TokenError {
    /// Returns `true` if the failure is about obtaining the verification key.
    #[must_use]
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            Self::JwksFetch(_) | Self::JwksDecode(_) | Self::NoKeys | Self::InvalidKey(_)
        )
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnexpectedAlgorithm(err.to_string())
            }
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::InvalidKey(err.to_string())
            }
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Returns the token after a case-sensitive `"Bearer "` prefix.
///
/// An empty string means no token: the header was empty, had another
/// scheme, or carried nothing after the prefix.
#[must_use]
pub fn extract_token_from_header(header: &str) -> &str {
    header.strip_prefix(BEARER_PREFIX).unwrap_or_default()
}

/// Verifies RSA-signed bearer tokens issued by the realm.
pub struct TokenVerifier {
    jwks_uri: String,
    http: reqwest::Client,
    key: OnceCell<DecodingKey>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("jwks_uri", &self.jwks_uri)
            .field("key_loaded", &self.key.initialized())
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Creates a verifier that loads its key from `jwks_uri` on first use.
    #[must_use]
    pub fn new(jwks_uri: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            http,
            key: OnceCell::new(),
        }
    }

    /// Creates a verifier with a preloaded key. The JWKS endpoint is never called.
    #[must_use]
    pub fn with_signing_key(key: DecodingKey) -> Self {
        Self {
            jwks_uri: String::new(),
            http: reqwest::Client::new(),
            key: OnceCell::from(key),
        }
    }

    #[must_use]
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    /// Returns `true` once the signing key has been loaded.
    #[must_use]
    pub fn has_signing_key(&self) -> bool {
        self.key.initialized()
    }

    /// Verifies `token` and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns a `TokenError` describing the first failed check. The key is
    /// loaded first, so a JWKS failure is reported before any token problem.
    pub async fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let key = self.signing_key().await?;

        let header = decode_header(token)?;
        if !matches!(
            header.alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
        ) {
            debug!(alg = ?header.alg, "Rejecting token with non-RSA algorithm");
            return Err(TokenError::UnexpectedAlgorithm(format!("{:?}", header.alg)));
        }

        let mut validation = Validation::new(header.alg);
        validation.validate_aud = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, key, &validation)?;

        if data.claims.exp <= now_unix() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }

    async fn signing_key(&self) -> Result<&DecodingKey, TokenError> {
        self.key.get_or_try_init(|| self.load_signing_key()).await
    }

    async fn load_signing_key(&self) -> Result<DecodingKey, TokenError> {
        debug!(url = %self.jwks_uri, "Fetching JWKS");

        let response = self.http.get(&self.jwks_uri).send().await.map_err(|e| {
            warn!(url = %self.jwks_uri, error = %e, "Failed to fetch JWKS");
            TokenError::JwksFetch(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!(url = %self.jwks_uri, status, "JWKS endpoint returned error status");
            return Err(TokenError::JwksFetch(format!("status {status}")));
        }

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| TokenError::JwksDecode(e.to_string()))?;

        let (kid, key) = jwks.first_decoding_key()?;
        info!(kid = %kid, keys = jwks.keys.len(), "Loaded token signing key");
        Ok(key)
    }
}
