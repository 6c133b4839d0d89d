//! Proxy server setup and initialization

use anyhow::{Context, Result};
use axum::{
    routing::{on, MethodFilter},
    Router,
};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::storage::EventSink;

use super::handlers::proxy_handler;
use super::relay::build_client;
use super::state::ProxyState;

fn proxied_methods() -> MethodFilter {
    MethodFilter::GET
        .or(MethodFilter::POST)
        .or(MethodFilter::PUT)
        .or(MethodFilter::PATCH)
        .or(MethodFilter::DELETE)
        .or(MethodFilter::OPTIONS)
}

/// Router for the relay: everything under `/v1/` goes upstream
///
/// Other methods on `/v1/*` get 405 and any other path gets 404.
pub fn build_router(state: ProxyState) -> Router {
    Router::new()
        .route("/v1/*path", on(proxied_methods(), proxy_handler))
        .with_state(state)
}

/// Start the proxy server
pub async fn start_proxy(
    config: &Config,
    events: EventSink,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let bind_addr = config.bind_addr;
    let client = build_client()?;
    let state = ProxyState::new(client, config.upstream.clone(), events);

    tracing::info!("Starting proxy on {}", bind_addr);

    let listener = TcpListener::bind(bind_addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Proxy listening on {}", bind_addr);

    serve(listener, state, shutdown_rx).await
}

/// Serve on an already-bound listener until `shutdown_rx` fires
pub async fn serve(
    listener: TcpListener,
    state: ProxyState,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    // Stops accepting on shutdown; in-flight streams run to completion
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("Proxy server shut down gracefully");
    Ok(())
}
