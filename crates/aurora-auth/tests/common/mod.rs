//! Shared fixtures: RSA signing keys and a fake Keycloak realm on wiremock.

#![allow(dead_code)]

use std::sync::{Arc, LazyLock};

use aurora_auth::{AuthConfig, AuthService, SessionStore, TokenVerifier};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{Value, json};
use time::OffsetDateTime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REALM: &str = "aurora";
pub const CLIENT_ID: &str = "aurora-api";
pub const CLIENT_SECRET: &str = "s3cret";

pub const DISCOVERY_PATH: &str = "/realms/aurora/.well-known/openid-configuration";
pub const AUTH_PATH: &str = "/realms/aurora/protocol/openid-connect/auth";
pub const TOKEN_PATH: &str = "/realms/aurora/protocol/openid-connect/token";
pub const CERTS_PATH: &str = "/realms/aurora/protocol/openid-connect/certs";
pub const LOGOUT_PATH: &str = "/realms/aurora/protocol/openid-connect/logout";
pub const REVOKE_PATH: &str = "/realms/aurora/protocol/openid-connect/revoke";

/// An RSA key pair usable for signing test tokens.
pub struct TestKey {
    pub kid: String,
    pub encoding: EncodingKey,
    pub n: String,
    pub e: String,
}

impl TestKey {
    pub fn generate(kid: &str) -> Self {
        let private = RsaPrivateKey::new(&mut OsRng, 2048).expect("generate RSA key");
        let pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode RSA key");
        let encoding = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("load RSA key");
        let public = private.to_public_key();

        Self {
            kid: kid.to_string(),
            encoding,
            n: URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
        }
    }

    pub fn jwk(&self) -> Value {
        json!({
            "kid": self.kid,
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "n": self.n,
            "e": self.e,
        })
    }

    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with(Algorithm::RS256, claims)
    }

    pub fn sign_with(&self, alg: Algorithm, claims: &Value) -> String {
        let mut header = Header::new(alg);
        header.kid = Some(self.kid.clone());
        encode(&header, claims, &self.encoding).expect("sign token")
    }
}

/// Key the fake realm publishes in its JWKS. Generated once per test binary.
pub static REALM_KEY: LazyLock<TestKey> = LazyLock::new(|| TestKey::generate("realm-key"));

/// A key the realm does not know about.
pub static ROGUE_KEY: LazyLock<TestKey> = LazyLock::new(|| TestKey::generate("rogue-key"));

pub fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Keycloak-shaped access token claims expiring `ttl_secs` from now.
pub fn access_claims(ttl_secs: i64, roles: &[&str]) -> Value {
    let now = now();
    json!({
        "sub": "7c1d2f3e-user",
        "exp": now + ttl_secs,
        "iat": now,
        "iss": "http://keycloak/realms/aurora",
        "aud": "account",
        "preferred_username": "jdoe",
        "email": "jdoe@example.com",
        "email_verified": true,
        "name": "Jane Doe",
        "given_name": "Jane",
        "family_name": "Doe",
        "realm_access": { "roles": roles },
        "resource_access": { "account": { "roles": ["view-profile"] } }
    })
}

pub fn discovery_document(base: &str) -> Value {
    json!({
        "issuer": format!("{base}/realms/{REALM}"),
        "authorization_endpoint": format!("{base}{AUTH_PATH}"),
        "token_endpoint": format!("{base}{TOKEN_PATH}"),
        "jwks_uri": format!("{base}{CERTS_PATH}"),
        "userinfo_endpoint": format!("{base}/realms/{REALM}/protocol/openid-connect/userinfo"),
        "end_session_endpoint": format!("{base}{LOGOUT_PATH}"),
        "revocation_endpoint": format!("{base}{REVOKE_PATH}"),
    })
}

pub fn token_response(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": "refresh-abc",
        "expires_in": 300,
        "refresh_expires_in": 1800,
        "token_type": "Bearer",
        "id_token": "id-xyz",
        "scope": "openid profile email roles"
    })
}

pub async fn mount_discovery(server: &MockServer, document: Value) {
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(server)
        .await;
}

pub async fn mount_jwks(server: &MockServer, keys: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(CERTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
        .mount(server)
        .await;
}

pub fn config_for(server: &MockServer) -> AuthConfig {
    AuthConfig {
        keycloak_url: server.uri(),
        realm: REALM.to_string(),
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
        base_url: "https://api.example.com".to_string(),
        default_redirect_uri: "https://app.example.com/after-login".to_string(),
        ..AuthConfig::default()
    }
}

pub fn service_for(config: AuthConfig) -> AuthService {
    let http = reqwest::Client::new();
    let verifier = Arc::new(TokenVerifier::new(config.jwks_uri(), http.clone()));
    AuthService::new(config, http, Arc::new(SessionStore::default()), verifier)
}
