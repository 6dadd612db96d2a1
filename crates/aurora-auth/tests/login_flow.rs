mod common;

use std::collections::HashMap;

use aurora_auth::oauth::{CallbackParams, LogoutRequest, PkceChallenge};
use aurora_auth::{AuthError, SessionError};
use common::*;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn query_map(url: &str) -> HashMap<String, String> {
    Url::parse(url)
        .expect("valid url")
        .query_pairs()
        .into_owned()
        .collect()
}

#[tokio::test]
async fn login_url_carries_pkce_and_client_parameters() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    let service = service_for(config_for(&server));

    let (login, session) = service
        .initiate_login(Some("https://app.example.com/cb"))
        .await
        .unwrap();

    assert!(login.auth_url.starts_with(&format!("{}{AUTH_PATH}?", server.uri())));
    assert_eq!(login.state, session.state);

    let params = query_map(&login.auth_url);
    assert_eq!(params["client_id"], CLIENT_ID);
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "openid profile email roles");
    assert_eq!(params["redirect_uri"], "https://app.example.com/cb");
    assert_eq!(params["state"], session.state);
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["code_challenge"], session.code_challenge);

    assert_eq!(
        PkceChallenge::from_verifier_str(&session.code_verifier).as_str(),
        session.code_challenge
    );
    assert!(!login.auth_url.contains(&session.code_verifier));
}

#[tokio::test]
async fn login_without_redirect_uses_configured_default() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    let service = service_for(config_for(&server));

    let (login, session) = service.initiate_login(None).await.unwrap();

    assert_eq!(session.redirect_uri, "https://app.example.com/after-login");
    assert_eq!(
        query_map(&login.auth_url)["redirect_uri"],
        "https://app.example.com/after-login"
    );
}

#[tokio::test]
async fn start_login_stores_session() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    let service = service_for(config_for(&server));

    let login = service.start_login(None).await.unwrap();

    let stored = assert_ok!(service.sessions().get(&login.state));
    assert_eq!(stored.state, login.state);
}

#[tokio::test]
async fn discovery_failure_aborts_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let service = service_for(config_for(&server));

    let err = service.start_login(None).await.unwrap_err();

    assert!(matches!(err, AuthError::Discovery(_)));
    assert!(service.sessions().is_empty());
}

#[tokio::test]
async fn code_exchange_posts_form_with_session_material() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    let service = service_for(config_for(&server));
    let (_, session) = service.initiate_login(None).await.unwrap();

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .and(body_string_contains(format!("client_id={CLIENT_ID}")))
        .and(body_string_contains(format!("client_secret={CLIENT_SECRET}")))
        .and(body_string_contains(format!(
            "code_verifier={}",
            session.code_verifier
        )))
        .and(body_string_contains(
            "redirect_uri=https%3A%2F%2Fapp.example.com%2Fafter-login",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response("at-1")))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = service
        .exchange_code_for_tokens("the-code", &session)
        .await
        .unwrap();

    assert_eq!(tokens.access_token, "at-1");
    assert_eq!(tokens.refresh_token, "refresh-abc");
    assert_eq!(tokens.expires_in, 300);
    assert_eq!(tokens.refresh_expires_in, 1800);
    assert_eq!(tokens.id_token.as_deref(), Some("id-xyz"));
}

#[tokio::test]
async fn non_200_from_token_endpoint_is_a_failure() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_response("at")))
        .mount(&server)
        .await;
    let service = service_for(config_for(&server));
    let (_, session) = service.initiate_login(None).await.unwrap();

    let err = service
        .exchange_code_for_tokens("code", &session)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AuthError::TokenEndpoint {
            operation: "code exchange",
            status: 201
        }
    ));
}

#[tokio::test]
async fn undecodable_token_body_is_a_failure() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let service = service_for(config_for(&server));

    let err = service.refresh_token("rt").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidTokenResponse(_)));
}

#[tokio::test]
async fn refresh_posts_refresh_grant() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .and(body_string_contains(format!("client_id={CLIENT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response("at-2")))
        .expect(1)
        .mount(&server)
        .await;
    let service = service_for(config_for(&server));

    let tokens = service.refresh_token("old-refresh").await.unwrap();
    assert_eq!(tokens.access_token, "at-2");
}

#[tokio::test]
async fn refresh_rejected_by_provider() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;
    let service = service_for(config_for(&server));

    let err = service.refresh_token("stale").await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::TokenEndpoint {
            operation: "token refresh",
            status: 400
        }
    ));
}

#[tokio::test]
async fn callback_completes_once_and_returns_user() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    mount_jwks(&server, vec![REALM_KEY.jwk()]).await;
    let access_token = REALM_KEY.sign(&access_claims(300, &["admin", "user"]));
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(&access_token)))
        .expect(1)
        .mount(&server)
        .await;
    let service = service_for(config_for(&server));
    let login = service.start_login(None).await.unwrap();

    let params = || CallbackParams {
        code: Some("auth-code".to_string()),
        state: Some(login.state.clone()),
        ..CallbackParams::default()
    };

    let result = service.handle_callback(params()).await.unwrap();
    assert_eq!(result.tokens.access_token, access_token);
    assert_eq!(result.user.username, "jdoe");
    assert_eq!(result.user.roles, vec!["admin", "user"]);

    // The session was consumed: a replay is rejected before any exchange.
    let replay = service.handle_callback(params()).await.unwrap_err();
    assert!(matches!(
        replay,
        AuthError::InvalidSession(SessionError::NotFound(_))
    ));
}

#[tokio::test]
async fn callback_rejects_unverifiable_access_token() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    mount_jwks(&server, vec![REALM_KEY.jwk()]).await;
    let forged = ROGUE_KEY.sign(&access_claims(300, &["admin"]));
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(&forged)))
        .mount(&server)
        .await;
    let service = service_for(config_for(&server));
    let login = service.start_login(None).await.unwrap();

    let err = service
        .handle_callback(CallbackParams {
            code: Some("auth-code".to_string()),
            state: Some(login.state),
            ..CallbackParams::default()
        })
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn logout_revokes_and_builds_end_session_url() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    Mock::given(method("POST"))
        .and(path(REVOKE_PATH))
        .and(body_string_contains("token=refresh-abc"))
        .and(body_string_contains("token_type_hint=refresh_token"))
        .and(body_string_contains(format!("client_secret={CLIENT_SECRET}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let service = service_for(config_for(&server));

    let response = service
        .logout(LogoutRequest {
            refresh_token: "refresh-abc".to_string(),
            redirect_uri: "https://app.example.com/bye".to_string(),
        })
        .await
        .unwrap();

    assert!(response.logout_url.starts_with(&format!("{}{LOGOUT_PATH}?", server.uri())));
    assert_eq!(
        query_map(&response.logout_url)["redirect_uri"],
        "https://app.example.com/bye"
    );
    assert_eq!(response.message, "User logged out successfully");
}

#[tokio::test]
async fn logout_succeeds_when_revocation_fails() {
    let server = MockServer::start().await;
    mount_discovery(&server, discovery_document(&server.uri())).await;
    Mock::given(method("POST"))
        .and(path(REVOKE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let service = service_for(config_for(&server));

    let response = assert_ok!(
        service
            .logout(LogoutRequest {
                refresh_token: "refresh-abc".to_string(),
                redirect_uri: "https://app.example.com/bye".to_string(),
            })
            .await
    );
    assert_eq!(
        query_map(&response.logout_url)["redirect_uri"],
        "https://app.example.com/bye"
    );
}

#[tokio::test]
async fn logout_succeeds_when_revocation_endpoint_is_unreachable() {
    let server = MockServer::start().await;
    let mut document = discovery_document(&server.uri());
    document["revocation_endpoint"] = json!("http://127.0.0.1:9/revoke");
    mount_discovery(&server, document).await;
    let service = service_for(config_for(&server));

    let response = assert_ok!(
        service
            .logout(LogoutRequest {
                refresh_token: "refresh-abc".to_string(),
                redirect_uri: String::new(),
            })
            .await
    );
    // Empty redirect falls back to the configured default.
    assert_eq!(
        query_map(&response.logout_url)["redirect_uri"],
        "https://app.example.com/after-login"
    );
}

#[tokio::test]
async fn logout_without_end_session_endpoint_fails() {
    let server = MockServer::start().await;
    let mut document = discovery_document(&server.uri());
    document.as_object_mut().unwrap().remove("end_session_endpoint");
    document.as_object_mut().unwrap().remove("revocation_endpoint");
    mount_discovery(&server, document).await;
    let service = service_for(config_for(&server));

    let err = assert_err!(service.logout(LogoutRequest::default()).await);
    assert!(matches!(
        err,
        AuthError::MissingEndpoint("end_session_endpoint")
    ));
}
