//! HTTP API over the chaos monkey engine

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use shared::logging;

use crate::engine::ChaosHandle;
use crate::error::ChaosResult;
use handlers::api::{disruption_status, get_status, list_services, trigger_disruption};

/// Build the Axum router with all routes
pub fn build_router(handle: ChaosHandle) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/services", get(list_services))
        .route("/services/:service/:action", post(trigger_disruption))
        .route("/services/:service/:action/status", get(disruption_status))
        .layer(TraceLayer::new_for_http())
        .with_state(handle)
}

/// Serve the API until the shutdown signal flips to `true`
pub async fn serve(addr: SocketAddr, handle: ChaosHandle, mut shutdown: watch::Receiver<bool>) -> ChaosResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    logging::log_startup("api", &format!("HTTP API on http://{addr}"));

    axum::serve(listener, build_router(handle))
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    logging::log_success("api", "HTTP API stopped");
    Ok(())
}
