//! Bearer token verification and claims.

pub mod claims;
pub mod jwks;
pub mod verifier;

pub use claims::{Claims, RoleSet, UserInfo};
pub use jwks::{Jwk, Jwks};
pub use verifier::{TokenError, TokenVerifier, extract_token_from_header};
