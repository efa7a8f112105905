use chart_panels::ChartError;
use std::{net::SocketAddr, path::PathBuf};
use thiserror::Error;

/// All errors generated in `chart-panels-server`.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind WebSocket server to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to read panel descriptors from {}: {source}", .path.display())]
    PanelsFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed client message: {0}")]
    Malformed(String),

    #[error("failed to serialise server message: {0}")]
    Serialise(#[from] serde_json::Error),

    #[error("render request names neither a panel nor a descriptor")]
    MissingPanel,

    #[error("no chart rendered yet, send a render message first")]
    NotRendered,

    #[error("{0}")]
    Chart(#[from] ChartError),
}
