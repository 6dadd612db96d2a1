//! JSON Web Key Set parsing.

use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};

use super::TokenError;

/// JSON Web Key Set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jwks {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

/// A single RSA JSON Web Key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default)]
    pub kid: String,

    #[serde(default)]
    pub kty: String,

    #[serde(default)]
    pub alg: String,

    #[serde(default, rename = "use")]
    pub use_: String,

    /// RSA modulus (base64url, big-endian).
    #[serde(default)]
    pub n: String,

    /// RSA exponent (base64url, big-endian).
    #[serde(default)]
    pub e: String,
}

impl Jwk {
    /// Builds an RSA verification key from the modulus and exponent.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if `n` or `e` is not valid base64url.
    pub fn to_decoding_key(&self) -> Result<DecodingKey, TokenError> {
        DecodingKey::from_rsa_components(&self.n, &self.e)
            .map_err(|e| TokenError::InvalidKey(e.to_string()))
    }
}

impl Jwks {
    /// Returns the verification key built from the first key in the set.
    ///
    /// Keys are not selected by `kid`; the first entry is the signing key.
    ///
    /// # Errors
    ///
    /// `NoKeys` for an empty set, `InvalidKey` if the first key cannot be decoded.
    pub fn first_decoding_key(&self) -> Result<(String, DecodingKey), TokenError> {
        let jwk = self.keys.first().ok_or(TokenError::NoKeys)?;
        Ok((jwk.kid.clone(), jwk.to_decoding_key()?))
    }
}
