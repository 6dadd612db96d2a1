//! Identity provider reachability check.

use std::time::Instant;

use serde::Serialize;
use tracing::warn;

use crate::config::AuthConfig;

/// Health of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    Up,
    Down,
}

/// Result of probing the identity provider's discovery endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub status: HealthState,
    pub component: &'static str,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderHealth {
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.status == HealthState::Up
    }
}

/// GETs the realm's discovery document and reports latency and status.
///
/// Any status other than 200 counts as down. Never fails; the outcome is in
/// the returned value.
pub async fn check_provider(http: &reqwest::Client, config: &AuthConfig) -> ProviderHealth {
    let url = config.discovery_url();
    let mut health = ProviderHealth {
        status: HealthState::Down,
        component: "keycloak",
        url: config.keycloak_url.clone(),
        latency_ms: None,
        http_status: None,
        error: None,
    };

    let start = Instant::now();
    let response = match http.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %url, error = %e, "Identity provider unreachable");
            health.error = Some(format!("failed to connect: {e}"));
            return health;
        }
    };
    health.latency_ms = Some(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));

    let status = response.status();
    health.http_status = Some(status.as_u16());
    if status == reqwest::StatusCode::OK {
        health.status = HealthState::Up;
    } else {
        warn!(url = %url, status = status.as_u16(), "Identity provider returned non-OK status");
        health.error = Some(format!("non-OK status: {status}"));
    }

    health
}
