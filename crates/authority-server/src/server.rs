use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use authority_cache::DecisionCache;

use crate::config::AppConfig;
use crate::handlers;
use crate::identity::{IdentityResolver, StaticTokenResolver};

/// Shared state threaded into every handler.
///
/// The cache is injected here rather than held as process-global state so
/// tests can substitute a memory-backed instance deterministically.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DecisionCache>,
    pub identity: Arc<dyn IdentityResolver>,
    pub decision_ttl: Duration,
}

pub struct AuthorityServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        // Decision gateway surface
        .route("/", post(handlers::check))
        .route("/batch", post(handlers::batch))
        .route("/status", get(handlers::status))
        .route("/invalidate", delete(handlers::invalidate))
        // Health and observability endpoints
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Connect the cache backend and assemble the server.
    ///
    /// The persistent backend is attempted here, once; any failure selects
    /// the in-process fallback for the lifetime of the process.
    pub async fn build(self) -> anyhow::Result<AuthorityServer> {
        let cache = crate::create_decision_cache(&self.config.redis).await;
        let identity: Arc<dyn IdentityResolver> =
            Arc::new(StaticTokenResolver::from_config(&self.config.auth));

        let state = AppState {
            cache: Arc::new(cache),
            identity,
            decision_ttl: self.config.decision_ttl(),
        };

        let app = build_app(state, self.config.server.body_limit_bytes);

        Ok(AuthorityServer {
            addr: self.addr,
            app,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorityServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
