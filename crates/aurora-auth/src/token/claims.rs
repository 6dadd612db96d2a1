//! Verified access-token claims as issued by a Keycloak realm.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A list of role names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Decoded and verified bearer-token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    #[serde(default)]
    pub sub: String,

    /// Expiry (unix seconds).
    pub exp: i64,

    /// Issued-at (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default)]
    pub preferred_username: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub email_verified: bool,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub given_name: String,

    #[serde(default)]
    pub family_name: String,

    /// Realm-wide roles.
    #[serde(default)]
    pub realm_access: RoleSet,

    /// Roles per client/resource.
    #[serde(default)]
    pub resource_access: HashMap<String, RoleSet>,
}

impl Claims {
    /// Realm roles carried by the token.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.realm_access.roles
    }

    /// Returns `true` if `role` is one of the realm roles.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.realm_access.roles.iter().any(|r| r == role)
    }

    /// Returns `true` if at least one of `roles` is a realm role.
    ///
    /// Resource-scoped roles are not consulted.
    #[must_use]
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|role| self.has_role(role.as_ref()))
    }

    /// Roles granted for one client/resource.
    #[must_use]
    pub fn resource_roles(&self, resource: &str) -> &[String] {
        self.resource_access
            .get(resource)
            .map(|set| set.roles.as_slice())
            .unwrap_or_default()
    }

    /// Projects the claims into the caller identity returned to clients.
    #[must_use]
    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            id: self.sub.clone(),
            username: self.preferred_username.clone(),
            email: self.email.clone(),
            email_verified: self.email_verified,
            name: self.name.clone(),
            given_name: self.given_name.clone(),
            family_name: self.family_name.clone(),
            roles: self.realm_access.roles.clone(),
            exp: self.exp,
            iat: self.iat,
        }
    }
}

/// Caller identity derived from verified claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: Option<i64>,
}
