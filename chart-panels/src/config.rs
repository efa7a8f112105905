//! Renderer-agnostic chart configuration.

use crate::{
    column::AlignedColumns,
    format::ValueFormat,
    panel::{
        AxisKind, CandleStyle, GridLayout, LineStyle, PanelDescriptor, SERIES_CANDLES,
        SERIES_ENTRY, SERIES_POSITION, SERIES_STOP_LOSS, SERIES_TAKE_PROFIT, SeriesId,
    },
    position::PositionSeries,
    series::{CandlePoint, Point, base_price, build_candles},
};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Layout grids, axes, series and zoom window of one rendered panel.
///
/// The default value is the empty configuration produced for an absent or empty frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartConfig {
    pub grids: Vec<GridLayout>,
    pub x_axes: Vec<TimeAxis>,
    pub y_axes: Vec<ValueAxis>,
    pub series: Vec<SeriesDef>,
    pub zoom: Option<ZoomWindow>,
}

impl ChartConfig {
    /// Build the configuration of the provided [`PanelDescriptor`] from its [`AlignedColumns`].
    pub fn build(descriptor: &PanelDescriptor, columns: &AlignedColumns) -> Self {
        let base_price = base_price(columns.column(&descriptor.candle.close));

        let x_axes = (0..descriptor.grids.len())
            .map(|grid| TimeAxis {
                grid,
                show_labels: grid == 0,
            })
            .collect();

        let y_axes = descriptor
            .grids
            .iter()
            .enumerate()
            .map(|(grid, layout)| ValueAxis {
                grid,
                label: match layout.axis {
                    AxisKind::Price => AxisLabel::Price { base_price },
                    AxisKind::Value(format) => AxisLabel::Value { format },
                },
            })
            .collect();

        let mut series = Vec::with_capacity(descriptor.series.len() + 5);

        series.push(SeriesDef {
            id: SeriesId::from(SERIES_CANDLES),
            name: descriptor.candle.name.clone(),
            kind: SeriesKind::Candlestick,
            grid: 0,
            data: SeriesData::Candles(build_candles(columns, &descriptor.candle)),
            style: SeriesStyle::Candle(descriptor.candle.style.clone()),
            tooltip: true,
        });

        if let Some(overlay) = &descriptor.position {
            let PositionSeries {
                line,
                entries,
                take_profit,
                stop_loss,
            } = PositionSeries::from_columns(columns, overlay);

            series.extend([
                SeriesDef::overlay_line(
                    SERIES_POSITION,
                    "Position",
                    overlay.grid,
                    line,
                    "#4DA3FF",
                ),
                SeriesDef {
                    id: SeriesId::from(SERIES_ENTRY),
                    name: SmolStr::new_static("Entry"),
                    kind: SeriesKind::Scatter,
                    grid: overlay.grid,
                    data: SeriesData::Points(entries),
                    style: SeriesStyle::Marker(MarkerStyle {
                        symbol: SmolStr::new_static("triangle"),
                        size: 8.0,
                        color: SmolStr::new_static("#00E676"),
                    }),
                    tooltip: false,
                },
                SeriesDef::overlay_line(
                    SERIES_TAKE_PROFIT,
                    "Take Profit",
                    overlay.grid,
                    take_profit,
                    "#4CAF50",
                ),
                SeriesDef::overlay_line(
                    SERIES_STOP_LOSS,
                    "Stop Loss",
                    overlay.grid,
                    stop_loss,
                    "#FF5252",
                ),
            ]);
        }

        series.extend(descriptor.series.iter().map(|spec| SeriesDef {
            id: spec.id.clone(),
            name: spec.name.clone(),
            kind: SeriesKind::Line,
            grid: spec.grid,
            data: SeriesData::Points(spec.source.build(columns)),
            style: SeriesStyle::Line(spec.style.clone()),
            tooltip: spec.tooltip,
        }));

        Self {
            grids: descriptor.grids.clone(),
            x_axes,
            y_axes,
            series,
            zoom: Some(descriptor.zoom.unwrap_or_default()),
        }
    }

    /// `true` for the empty configuration (no grids, axes or series).
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty() && self.series.is_empty()
    }

    pub fn series(&self, id: &str) -> Option<&SeriesDef> {
        self.series.iter().find(|series| series.id.as_ref() == id)
    }
}

/// Time x-axis of one grid. All x-axes share one axis pointer; only grid 0 shows labels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct TimeAxis {
    pub grid: usize,
    pub show_labels: bool,
}

/// Value y-axis of one grid.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ValueAxis {
    pub grid: usize,
    pub label: AxisLabel,
}

/// How a y-axis labels its values and its axis pointer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisLabel {
    /// Price with the change relative to `base_price`, if any.
    Price { base_price: Option<f64> },
    Value { format: ValueFormat },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Candlestick,
    Line,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesData {
    Candles(Vec<CandlePoint>),
    Points(Vec<Point>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Candles(candles) => candles.len(),
            SeriesData::Points(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> Option<&[Point]> {
        match self {
            SeriesData::Points(points) => Some(points),
            SeriesData::Candles(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeriesStyle {
    Candle(CandleStyle),
    Line(LineStyle),
    Marker(MarkerStyle),
}

/// Scatter marker appearance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub symbol: SmolStr,
    pub size: f64,
    pub color: SmolStr,
}

/// One renderer series. Line series never connect across null points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDef {
    pub id: SeriesId,
    pub name: SmolStr,
    pub kind: SeriesKind,
    pub grid: usize,
    pub data: SeriesData,
    pub style: SeriesStyle,
    /// Whether the series' own values show in the renderer's default tooltip.
    pub tooltip: bool,
}

impl SeriesDef {
    fn overlay_line(id: &str, name: &'static str, grid: usize, data: Vec<Point>, color: &str) -> Self {
        Self {
            id: SeriesId::from(id),
            name: SmolStr::new_static(name),
            kind: SeriesKind::Line,
            grid,
            data: SeriesData::Points(data),
            style: SeriesStyle::Line(LineStyle::dashed(color)),
            tooltip: false,
        }
    }
}

/// Initial visible x-range in percent of the full range. Zoom applies to every grid at once.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct ZoomWindow {
    pub start: f64,
    pub end: f64,
}

impl Default for ZoomWindow {
    fn default() -> Self {
        Self {
            start: 80.0,
            end: 100.0,
        }
    }
}
