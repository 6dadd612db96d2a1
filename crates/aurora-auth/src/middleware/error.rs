//! HTTP rendering of [`AuthError`].
//!
//! Bodies are `{"error": ...}` JSON. Internal detail (session vs. expiry,
//! signature vs. expiry, upstream status codes) is logged, never returned.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::error;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = error_details(&self);

        if status.is_server_error() {
            error!(error = %self, "Auth request failed");
        }

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"aurora\", error=\"invalid_token\""),
            );
        }
        response
    }
}

/// Maps an error to its status code and client-facing body.
fn error_details(err: &AuthError) -> (StatusCode, Value) {
    match err {
        AuthError::InvalidSession(_) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid session" }),
        ),
        AuthError::IdentityProvider { error, description } => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": error,
                "description": description.as_deref().unwrap_or_default(),
            }),
        ),
        AuthError::InvalidRequest { message } => {
            (StatusCode::BAD_REQUEST, json!({ "error": message }))
        }
        AuthError::InvalidToken(_) => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Invalid token" }),
        ),
        AuthError::MissingToken => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Authorization header required" }),
        ),
        AuthError::Forbidden { .. } => (
            StatusCode::FORBIDDEN,
            json!({ "error": "Insufficient permissions" }),
        ),
        AuthError::Discovery(_)
        | AuthError::Network(_)
        | AuthError::TokenEndpoint { .. }
        | AuthError::InvalidTokenResponse(_)
        | AuthError::Url(_)
        | AuthError::MissingEndpoint(_)
        | AuthError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Internal server error" }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionError;
    use crate::token::TokenError;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_session_is_400_and_generic() {
        let not_found = AuthError::from(SessionError::NotFound("s".to_string())).into_response();
        let expired = AuthError::from(SessionError::Expired("s".to_string())).into_response();

        assert_eq!(not_found.status(), StatusCode::BAD_REQUEST);
        assert_eq!(expired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(not_found).await, body_json(expired).await);
    }

    #[tokio::test]
    async fn test_invalid_token_is_401_with_challenge() {
        let response = AuthError::from(TokenError::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("Bearer")
        );
        assert_eq!(body_json(response).await["error"], "Invalid token");
    }

    #[tokio::test]
    async fn test_signature_and_expiry_render_identically() {
        let sig = body_json(AuthError::from(TokenError::InvalidSignature).into_response()).await;
        let exp = body_json(AuthError::from(TokenError::Expired).into_response()).await;
        assert_eq!(sig, exp);
    }

    #[tokio::test]
    async fn test_identity_provider_error_is_400() {
        let response = AuthError::identity_provider(
            "access_denied",
            Some("User cancelled login".to_string()),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "access_denied");
        assert_eq!(body["description"], "User cancelled login");
    }

    #[tokio::test]
    async fn test_upstream_errors_are_500_without_detail() {
        let response = AuthError::TokenEndpoint {
            operation: "code exchange",
            status: 401,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_forbidden_is_403() {
        let response = AuthError::forbidden("requires admin").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
