//! HTTP server for PoolPro

mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::{Context, Result};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub use error::ApiError;

use crate::plan::PlanOrchestrator;

/// Application state shared across handlers
pub struct AppState {
    pub orchestrator: PlanOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: PlanOrchestrator) -> Self {
        Self { orchestrator }
    }
}

/// Build the application router
pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    debug!(%body_limit_bytes, "router: called");
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::calculator_routes())
        .merge(routes::diagnose_routes())
        .with_state(Arc::new(state))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C
pub async fn run(state: AppState, bind: &str, port: u16, body_limit_bytes: usize) -> Result<()> {
    debug!(%bind, %port, "run: called");
    let app = router(state, body_limit_bytes);

    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
    }
}
