//! OpenID Connect discovery client.
//!
//! Fetches the realm's `.well-known/openid-configuration` document. With a
//! zero TTL (the default) every call goes to the network, so endpoint changes
//! at the identity provider are picked up immediately. A positive TTL reuses
//! the last good document until it ages out; failures are never cached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Endpoints published by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    #[serde(default)]
    pub issuer: String,

    pub authorization_endpoint: String,

    pub token_endpoint: String,

    #[serde(default)]
    pub jwks_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,
}

/// Errors that can occur while fetching the discovery document.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// A network error occurred while fetching the discovery document.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The HTTP request returned a non-success status code.
    #[error("HTTP error: status {0}")]
    HttpError(u16),

    /// The discovery document could not be parsed as JSON.
    #[error("Failed to parse discovery document: {0}")]
    ParseError(String),
}

#[derive(Debug)]
struct CachedDocument {
    document: Arc<DiscoveryDocument>,
    fetched_at: Instant,
}

/// Client for one discovery URL, with an optional TTL cache.
#[derive(Debug)]
pub struct DiscoveryClient {
    http: reqwest::Client,
    url: String,
    ttl: Duration,
    cache: RwLock<Option<CachedDocument>>,
}

impl DiscoveryClient {
    /// Creates an uncached client for `url`.
    #[must_use]
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            ttl: Duration::ZERO,
            cache: RwLock::new(None),
        }
    }

    /// Enables caching for `ttl`. Zero disables it.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the discovery document, from cache when allowed.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError` if the document cannot be fetched or decoded.
    pub async fn get(&self) -> Result<Arc<DiscoveryDocument>, DiscoveryError> {
        if self.ttl.is_zero() {
            return self.fetch().await.map(Arc::new);
        }

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref()
                && cached.fetched_at.elapsed() < self.ttl
            {
                return Ok(Arc::clone(&cached.document));
            }
        }

        let document = Arc::new(self.fetch().await?);
        *self.cache.write().await = Some(CachedDocument {
            document: Arc::clone(&document),
            fetched_at: Instant::now(),
        });
        Ok(document)
    }

    /// Fetches the document from the network, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError` on transport failure, non-2xx status or an
    /// undecodable body.
    pub async fn fetch(&self) -> Result<DiscoveryDocument, DiscoveryError> {
        debug!(url = %self.url, "Fetching OIDC discovery document");

        let response = self
            .http
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "Failed to fetch OIDC discovery document");
                DiscoveryError::NetworkError(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!(url = %self.url, status, "OIDC discovery returned error status");
            return Err(DiscoveryError::HttpError(status));
        }

        response.json::<DiscoveryDocument>().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "Failed to decode OIDC discovery document");
            DiscoveryError::ParseError(e.to_string())
        })
    }

    /// Drops the cached document, if any.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}
