use std::{net::SocketAddr, sync::Arc};

use aurora_auth::{AuthService, AuthState, SessionStore, SessionSweeper, TokenVerifier};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

/// Everything the running process shares: the auth state behind the
/// handlers and the handshake store the sweeper purges.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()?;
        let sessions = Arc::new(SessionStore::new(cfg.auth.session_ttl));
        let verifier = Arc::new(TokenVerifier::new(cfg.auth.jwks_uri(), http.clone()));
        let service = AuthService::new(
            cfg.auth.clone(),
            http,
            Arc::clone(&sessions),
            verifier,
        );
        Ok(Self {
            auth: AuthState::new(Arc::new(service)),
            sessions,
        })
    }
}

pub fn build_app(state: &AppState) -> Router {
    let health = Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone());

    aurora_auth::http::router(state.auth.clone())
        .merge(health)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("http.status_code", res.status().as_u16());
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
}

/// Reports identity provider reachability; 503 when it is down.
async fn health_handler(State(state): State<AppState>) -> Response {
    let health = state.auth.service.provider_health().await;
    let status = if health.is_up() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health)).into_response()
}

pub struct AuroraServer {
    addr: SocketAddr,
    config: AppConfig,
    state: AppState,
    app: Router,
}

impl AuroraServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serves until Ctrl-C or SIGTERM, then stops the session sweeper.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: tokio::net::TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let sweeper = SessionSweeper::start(
            Arc::clone(&self.state.sessions),
            self.config.auth.session_sweep_interval,
        );
        tracing::info!(
            addr = %listener.local_addr()?,
            realm = %self.config.auth.realm,
            "listening"
        );

        let served = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await;

        sweeper.shutdown().await;
        served?;
        Ok(())
    }
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<AuroraServer> {
        let state = AppState::from_config(&self.config)?;
        let app = build_app(&state);

        Ok(AuroraServer {
            addr: self.addr,
            config: self.config,
            state,
            app,
        })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
