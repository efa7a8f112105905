//! WebSocket server for rendering chart panels.
//!
//! Clients send `render` requests carrying a data frame plus a registered panel name (or an
//! inline descriptor) and receive the chart configuration, then resolve hover tooltips and price
//! labels against the last rendered chart of their connection.

mod config;
mod error;
mod protocol;
mod server;
mod session;

use crate::{config::ServerConfig, error::ServerError};
use chart_panels::PanelRegistry;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    init_logging();

    info!("Starting chart-panels WebSocket server");

    if let Err(error) = run(ServerConfig::from_env()).await {
        error!(%error, "chart-panels server failed");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let registry = Arc::new(load_registry(&config)?);
    info!(panels = ?registry.names(), "panel registry ready");

    let listener = server::bind(config.addr).await?;
    info!("WebSocket server listening on ws://{}", config.addr);

    server::serve(listener, registry, async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    })
    .await;

    Ok(())
}

/// Built-in presets plus the descriptors of the configured panels file, if any
fn load_registry(config: &ServerConfig) -> Result<PanelRegistry, ServerError> {
    let mut registry = PanelRegistry::with_presets();

    if let Some(path) = &config.panels_file {
        let input = std::fs::read_to_string(path).map_err(|source| ServerError::PanelsFile {
            path: path.clone(),
            source,
        })?;
        registry.extend_from_json(&input)?;
    }

    Ok(registry)
}

/// Initialize logging
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
