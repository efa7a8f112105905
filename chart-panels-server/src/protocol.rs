//! Client/server message protocol
//!
//! JSON text frames tagged by `type`, e.g. `{"type": "hover", "time": 1700000000000}`.

use chart_panels::{ChartConfig, Hover, PanelData, PanelDescriptor};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Message sent by a client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Render a frame with a registered panel or an inline descriptor
    Render(RenderRequest),
    /// Resolve the tooltip of the last rendered chart
    Hover(Hover),
    /// Format a price axis-pointer label of the last rendered chart
    PriceLabel { value: f64 },
    /// List registered panel names
    Panels,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderRequest {
    /// Registered panel name, used when no inline descriptor is provided
    #[serde(default)]
    pub panel: Option<SmolStr>,
    #[serde(default)]
    pub descriptor: Option<PanelDescriptor>,
    #[serde(default)]
    pub data: PanelData,
}

/// Message sent by the server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { panels: Vec<SmolStr> },
    Config { config: ChartConfig },
    Tooltip { text: String },
    PriceLabel { text: String },
    Panels { names: Vec<SmolStr> },
    Error { message: String },
}
