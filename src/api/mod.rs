//! HTTP API shim
//!
//! Exposes the article lists, cached snapshots and the cookie admin endpoint
//! over axum.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::SnapshotCache;
use crate::config::ServerConfig;
use crate::crawler::allowlist::HostAllowlist;
use crate::crawler::orchestrator::ArticleSource;
use crate::crawler::session::SessionState;

pub use routes::create_router;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Live article source
    pub scraper: Arc<dyn ArticleSource>,

    /// Hosts requests may target
    pub allowlist: Arc<HostAllowlist>,

    /// Snapshots kept warm by the refresher
    pub cache: Arc<SnapshotCache>,

    /// Cookie session
    pub session: Arc<SessionState>,

    /// Token required by admin endpoints
    pub admin_token: Option<String>,

    /// Site used when a request names none
    pub default_site: String,

    /// Server start time
    pub start_time: Instant,
}

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// API server
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes and layers
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown_signal` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!(%addr, "Starting API server");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("API server shutdown complete");
        Ok(())
    }
}
