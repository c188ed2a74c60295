// ABOUTME: HTTP server lifecycle: bind, serve, graceful shutdown, and the expiry sweep task
// ABOUTME: Everything the binary does after configuration and logging are ready
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Taskgate Contributors

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::oauth2_server::OAuth2AuthorizationServer;
use crate::resources::ServerResources;
use crate::routes;

/// Run the expiry sweep every `interval` until the task is aborted
///
/// Returns `None` when `interval` is zero.
#[must_use]
pub fn spawn_cleanup_task(
    oauth_server: Arc<OAuth2AuthorizationServer>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        info!("Background credential sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = oauth_server.cleanup_expired().await {
                warn!(error = %e, "Scheduled credential sweep failed");
            }
        }
    }))
}

/// Serve the full router on `port` until Ctrl-C
///
/// # Errors
/// Returns an error if the port cannot be bound or the server fails
pub async fn run(resources: Arc<ServerResources>, port: u16) -> Result<()> {
    let sweep = spawn_cleanup_task(
        Arc::clone(&resources.oauth_server),
        Duration::from_secs(resources.config.cleanup_interval_secs),
    );

    let app = routes::router(&resources);
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {port}"))?;

    info!(port, "HTTP server listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    if let Some(handle) = sweep {
        handle.abort();
    }
    info!("HTTP server stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
