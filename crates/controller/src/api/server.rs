use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use super::handlers;
use crate::metrics::ControllerMetrics;

pub fn router(metrics: Arc<ControllerMetrics>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/ready", get(handlers::ready))
        .route("/metrics", get(handlers::prometheus))
        .with_state(metrics)
}

pub async fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "metrics endpoint listening");
    Ok(listener)
}

pub async fn serve(listener: TcpListener, metrics: Arc<ControllerMetrics>) -> std::io::Result<()> {
    axum::serve(listener, router(metrics)).await
}
