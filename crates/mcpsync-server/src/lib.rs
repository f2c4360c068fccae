//! McpSync Trigger Service
//!
//! HTTP server exposing the sync trigger endpoints the outer scheduler
//! calls, plus health and status. All sync work is gated behind the shared
//! bearer secret; the scheduler owns retries, this service owns one run at
//! a time per source.

mod handlers;
mod state;

pub use handlers::{HealthResponse, StatusResponse, SyncRequest, SyncResponse};
pub use state::{AppState, SyncLocks};

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use mcpsync_core::{ServerRecordRepository, ServiceConfig};

/// The trigger HTTP server.
pub struct SyncServer {
    state: AppState,
}

impl SyncServer {
    pub fn new(config: ServiceConfig, repository: Arc<dyn ServerRecordRepository>) -> Self {
        Self {
            state: AppState::new(config, repository),
        }
    }

    /// Build the router. Exposed separately so tests can drive it without
    /// binding a socket.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/sync/registry",
                get(handlers::sync_registry).post(handlers::sync_registry),
            )
            .route(
                "/sync/chain",
                get(handlers::sync_chain).post(handlers::sync_chain),
            )
            .route("/sync/status", get(handlers::sync_status))
            .layer(CorsLayer::new().allow_origin(Any))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind and serve until shutdown.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.state.config.addr();
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Trigger service listening on {}", addr);

        axum::serve(listener, router).await?;

        Ok(())
    }
}
