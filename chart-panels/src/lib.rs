//! Chart Panels - declarative candlestick panel rendering
//!
//! Turns one tabular query result (a [`Frame`]) plus a [`PanelDescriptor`] into:
//! - A renderer-agnostic [`ChartConfig`]: grids, axes, candle/line/scatter series, zoom window
//! - A [`TooltipResolver`] answering hovers with ordered tooltip lines
//!
//! The pipeline is pure and synchronous. Missing columns, missing frames and unguarded ratios
//! degrade to empty or omitted output, never to errors.

pub mod column;
pub mod config;
pub mod error;
pub mod format;
pub mod frame;
pub mod panel;
pub mod position;
pub mod series;
pub mod tooltip;

use tracing::debug;

pub use column::AlignedColumns;
pub use config::{ChartConfig, SeriesDef, SeriesKind, ZoomWindow};
pub use error::ChartError;
pub use format::{PriceLabel, ValueFormat};
pub use frame::{Field, Frame, PanelData};
pub use panel::{PanelDescriptor, SeriesId, registry::PanelRegistry};
pub use tooltip::{Hover, TooltipResolver};

/// Rendered panel: the chart configuration plus the tooltip resolver standing in for the
/// renderer's formatter callback.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chart {
    pub config: ChartConfig,
    pub tooltip: TooltipResolver,
}

impl Chart {
    /// Chart of an absent or empty frame: no grids, axes or series.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.config.is_empty()
    }
}

/// Render the provided [`Frame`] with the provided [`PanelDescriptor`].
///
/// An absent frame, or one without usable time cells, yields [`Chart::empty`].
pub fn render(frame: Option<&Frame>, descriptor: &PanelDescriptor) -> Chart {
    let Some(columns) = AlignedColumns::resolve(
        frame,
        &descriptor.candle.time,
        descriptor.consumed_columns(),
    ) else {
        debug!(panel = %descriptor.name, "no rows to render, producing empty chart");
        return Chart::empty();
    };

    let config = ChartConfig::build(descriptor, &columns);

    debug!(
        panel = %descriptor.name,
        rows = columns.len(),
        series = config.series.len(),
        "rendered chart"
    );

    Chart {
        config,
        tooltip: TooltipResolver::new(descriptor, columns),
    }
}
