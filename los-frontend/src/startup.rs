use crate::config::FrontendConfig;
use crate::handlers::app::{health_check, index};
use axum::{middleware::from_fn, routing::get, Router};
use service_core::middleware::tracing::{http_trace_layer, request_id_middleware};
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub fn build_router(config: FrontendConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .with_state(config)
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
}

pub async fn run(config: FrontendConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", addr, e)
    })?;

    tracing::info!(backend_url = %config.backend_url, "Frontend listening on {}", addr);
    axum::serve(listener, build_router(config))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            anyhow::anyhow!("Server error: {}", e)
        })
}
