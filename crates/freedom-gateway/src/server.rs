// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use freedom_config::model::ServerConfig as ServerSection;
use freedom_core::FreedomError;
use freedom_pipeline::{Pipeline, PropagateHandler, ScanHandler, TaskHandler};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The pipeline every route operates on.
    pub pipeline: Pipeline,
    pub scan: Arc<dyn TaskHandler>,
    pub propagate: Arc<dyn TaskHandler>,
}

impl GatewayState {
    pub fn new(pipeline: Pipeline) -> Self {
        let scan = Arc::new(ScanHandler::new(pipeline.scanner.clone()));
        let propagate = Arc::new(PropagateHandler::new(pipeline.propagator.clone()));
        Self {
            pipeline,
            scan,
            propagate,
        }
    }
}

/// Address the gateway binds to.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_config(config: &ServerSection) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// All gateway routes over `state`.
///
/// - POST /migrate
/// - GET /migration/{id}
/// - POST /migration/{id}/stop, POST /migration/{id}/resume
/// - POST /_ah/queue/scan, POST /_ah/queue/propagate
/// - GET /health
pub fn router(state: GatewayState) -> Router {
    let user_routes = Router::new()
        .route("/migrate", post(handlers::post_migrate))
        .route("/migration/{id}", get(handlers::get_migration))
        .route("/migration/{id}/stop", post(handlers::post_stop))
        .route("/migration/{id}/resume", post(handlers::post_resume));

    // Push endpoints for the task queue. Status codes drive redelivery.
    let task_routes = Router::new()
        .route("/_ah/queue/scan", post(handlers::post_scan_task))
        .route("/_ah/queue/propagate", post(handlers::post_propagate_task));

    Router::new()
        .route("/health", get(handlers::get_health))
        .merge(user_routes)
        .merge(task_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the gateway until `cancel` fires, then finish in-flight requests.
pub async fn serve(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), FreedomError> {
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FreedomError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| FreedomError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_reads_the_server_section() {
        let config = ServerConfig::from_config(&ServerSection::default());
        assert_eq!(config.addr(), format!("{}:{}", config.host, config.port));
        let debug = format!("{config:?}");
        assert!(debug.contains(&config.host));
    }
}
