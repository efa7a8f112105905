use crate::{
    error::ServerError,
    protocol::{ClientMessage, RenderRequest, ServerMessage},
};
use chart_panels::{Chart, Hover, PanelRegistry, render};
use std::{borrow::Cow, sync::Arc};
use tracing::{debug, warn};

/// Per-connection state: the last rendered [`Chart`]. A newer render replaces it.
#[derive(Debug)]
pub struct Session {
    registry: Arc<PanelRegistry>,
    chart: Option<Chart>,
}

impl Session {
    pub fn new(registry: Arc<PanelRegistry>) -> Self {
        Self {
            registry,
            chart: None,
        }
    }

    pub fn welcome(&self) -> ServerMessage {
        ServerMessage::Welcome {
            panels: self.registry.names(),
        }
    }

    /// Decode and handle one client text frame. Failures become [`ServerMessage::Error`].
    pub fn handle_text(&mut self, text: &str) -> ServerMessage {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle(message),
            Err(error) => Self::reply_error(ServerError::Malformed(error.to_string())),
        }
    }

    /// Handle one decoded client message. Failures become [`ServerMessage::Error`].
    pub fn handle(&mut self, message: ClientMessage) -> ServerMessage {
        self.try_handle(message).unwrap_or_else(Self::reply_error)
    }

    fn try_handle(&mut self, message: ClientMessage) -> Result<ServerMessage, ServerError> {
        match message {
            ClientMessage::Render(request) => self.render(request),
            ClientMessage::Hover(hover) => self.hover(&hover),
            ClientMessage::PriceLabel { value } => Ok(ServerMessage::PriceLabel {
                text: self.chart()?.tooltip.price_label(value),
            }),
            ClientMessage::Panels => Ok(ServerMessage::Panels {
                names: self.registry.names(),
            }),
        }
    }

    fn render(&mut self, request: RenderRequest) -> Result<ServerMessage, ServerError> {
        let RenderRequest {
            panel,
            descriptor,
            data,
        } = request;

        let descriptor = match (descriptor, panel) {
            (Some(descriptor), _) => {
                descriptor.validate()?;
                Cow::Owned(descriptor)
            }
            (None, Some(panel)) => Cow::Borrowed(self.registry.get(&panel)?),
            (None, None) => return Err(ServerError::MissingPanel),
        };

        let chart = render(data.frame(), &descriptor);
        debug!(
            panel = %descriptor.name,
            series = chart.config.series.len(),
            empty = chart.is_empty(),
            "rendered panel"
        );

        let config = chart.config.clone();
        self.chart = Some(chart);

        Ok(ServerMessage::Config { config })
    }

    fn hover(&self, hover: &Hover) -> Result<ServerMessage, ServerError> {
        Ok(ServerMessage::Tooltip {
            text: self.chart()?.tooltip.text(hover),
        })
    }

    fn chart(&self) -> Result<&Chart, ServerError> {
        self.chart.as_ref().ok_or(ServerError::NotRendered)
    }

    fn reply_error(error: ServerError) -> ServerMessage {
        warn!(%error, "client request failed");
        ServerMessage::Error {
            message: error.to_string(),
        }
    }
}
