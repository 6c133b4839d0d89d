// Usage Relay - attribution proxy for OpenAI-compatible APIs
//
// Sits between a chat front-end and an upstream such as OpenRouter. Callers'
// credentials are replaced with the relay's own, the caller identity is
// injected as the `user` field, and streamed responses are passed through
// untouched while usage reports are sniffed out of them.
//
// Architecture:
// - Proxy server (axum): forwards `/v1/*` to the upstream (reqwest)
// - SSE sniffer: watches response frames for `usage` objects
// - Storage: writes telemetry events as JSON Lines (stdout or file)
// - Event system: a bounded mpsc channel connects the proxy to storage

mod cli;
mod config;
mod events;
mod logging;
mod proxy;
mod startup;
mod storage;

use anyhow::Result;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --path)
    if cli::handle_cli() {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = Config::load()?;

    // Keep alive until exit so file logs flush
    let _file_guard = logging::init(&config.logging);

    tracing::debug!("Loaded config: {:?}", config);

    // Telemetry: the sink goes to the proxy, the writer drains it
    let (event_sink, event_writer) = storage::from_config(&config.events)?;
    let storage_handle = event_writer.map(|writer| {
        tokio::spawn(async move {
            if let Err(e) = writer.run().await {
                tracing::error!("Event writer error: {:?}", e);
            }
        })
    });

    // Create shutdown channel for graceful proxy shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let mut proxy_handle = {
        let config = config.clone();
        tokio::spawn(async move { proxy::start_proxy(&config, event_sink, shutdown_rx).await })
    };

    startup::print_startup(&config);
    startup::log_startup(&config);

    // Run until Ctrl+C, or until the proxy stops on its own (e.g. bind failure)
    let proxy_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutting down...");

            // If the send fails, the proxy has already shut down (which is fine)
            let _ = shutdown_tx.send(());
            (&mut proxy_handle).await
        }
        result = &mut proxy_handle => result,
    };

    // Proxy exit drops the last EventSink, which lets the writer drain and stop
    if let Some(handle) = storage_handle {
        let _ = handle.await;
    }

    proxy_result??;

    tracing::info!("Shutdown complete");
    Ok(())
}
