//! Startup orchestration.
//!
//! # Responsibilities
//! - Warn about missing secrets
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A missing proxy token is not fatal; the gateway answers 500 until provisioned

use std::error::Error;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::lifecycle::{shutdown_signal, Shutdown};
use crate::observability::metrics;

/// Log configuration problems that do not prevent startup.
pub fn warn_on_missing_secrets(config: &GatewayConfig) {
    if !config.auth.is_configured() {
        tracing::warn!("No proxy token configured; every forward request will be refused with 500");
    }
    if config.upstream.api_key.is_empty() {
        tracing::warn!("No upstream API key configured; the upstream will likely reject requests");
    }
}

/// Start every subsystem and serve until shutdown.
pub async fn serve(config: GatewayConfig) -> Result<(), Box<dyn Error>> {
    warn_on_missing_secrets(&config);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        cors_allow_origin = %config.auth.cors_allow_origin,
        request_timeout_secs = config.upstream.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;
    signal_task.abort();

    Ok(())
}
