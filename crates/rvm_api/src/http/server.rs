use anyhow::Context;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{rvm_routes, HttpLoggingConfig, HttpLoggingLayer};
use crate::domain::RvmService;

/// HTTP server configuration
#[derive(Clone, Debug)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub logging_config: HttpLoggingConfig,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            logging_config: HttpLoggingConfig::default(),
        }
    }
}

/// Full application router: catalog routes, liveness probe and request logging
pub fn build_router(service: Arc<RvmService>, logging_config: HttpLoggingConfig) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(rvm_routes(service))
        .layer(HttpLoggingLayer::new(logging_config))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serve until the cancellation token fires, then drain in-flight requests
pub async fn run_http_server(
    config: HttpServerConfig,
    service: Arc<RvmService>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", address))?;

    info!("Starting HTTP server on {}", address);

    let app = build_router(service, config.logging_config);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancellation_token.cancelled().await;
            info!("HTTP server shutdown signal received");
        })
        .await;

    match result {
        Ok(()) => {
            info!("HTTP server stopped gracefully");
            Ok(())
        }
        Err(e) => {
            error!("HTTP server error: {}", e);
            Err(e.into())
        }
    }
}
