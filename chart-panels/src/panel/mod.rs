use crate::{
    column::AlignedColumns,
    config::ZoomWindow,
    error::ChartError,
    format::ValueFormat,
    series::{Point, metric_series, scaled_series},
};
use derive_more::{Display, From};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Built-in [`PanelDescriptor`]s for the standard position and indicator panels.
pub mod preset;

/// Name-indexed collection of validated [`PanelDescriptor`]s.
pub mod registry;

/// [`SeriesId`] of the candlestick series every panel draws on grid 0.
pub const SERIES_CANDLES: &str = "candles";
/// [`SeriesId`] of the position price line.
pub const SERIES_POSITION: &str = "position";
/// [`SeriesId`] of the position entry markers.
pub const SERIES_ENTRY: &str = "entry";
/// [`SeriesId`] of the take-profit line.
pub const SERIES_TAKE_PROFIT: &str = "take_profit";
/// [`SeriesId`] of the stop-loss line.
pub const SERIES_STOP_LOSS: &str = "stop_loss";

const RESERVED_SERIES: [&str; 5] = [
    SERIES_CANDLES,
    SERIES_POSITION,
    SERIES_ENTRY,
    SERIES_TAKE_PROFIT,
    SERIES_STOP_LOSS,
];

/// Stable identifier of a series within one panel.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize, Display, From)]
#[serde(transparent)]
pub struct SeriesId(pub SmolStr);

impl SeriesId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for SeriesId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl AsRef<str> for SeriesId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Declarative description of one chart panel.
///
/// One rendering engine drives every panel; a panel only differs in the columns it reads, how
/// those become series, where they are laid out and which values its tooltip lists.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PanelDescriptor {
    pub name: SmolStr,
    #[serde(default)]
    pub candle: CandleColumns,
    /// Column holding the upstream candle index, shown as `index: N` in the tooltip.
    #[serde(default)]
    pub index_column: Option<SmolStr>,
    #[serde(default)]
    pub position: Option<PositionOverlay>,
    pub grids: Vec<GridLayout>,
    #[serde(default)]
    pub series: Vec<SeriesSpec>,
    /// Panel metric lines of the tooltip, in display order.
    #[serde(default)]
    pub tooltip: Vec<TooltipField>,
    #[serde(default)]
    pub zoom: Option<ZoomWindow>,
}

impl PanelDescriptor {
    /// Decode and validate a [`PanelDescriptor`] from JSON.
    pub fn from_json(input: &str) -> Result<Self, ChartError> {
        let descriptor = serde_json::from_str::<Self>(input)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check the structural invariants the rendering engine relies on.
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.grids.is_empty() {
            return Err(ChartError::NoGrids {
                panel: self.name.clone(),
            });
        }

        if let Some(position) = &self.position {
            self.check_grid(SERIES_POSITION, position.grid)?;
        }

        for spec in &self.series {
            self.check_grid(spec.id.as_ref(), spec.grid)?;

            if let SeriesSource::Scaled { factor, .. } = spec.source {
                if !factor.is_finite() {
                    return Err(ChartError::InvalidFactor {
                        panel: self.name.clone(),
                        series: spec.id.0.clone(),
                        factor,
                    });
                }
            }
        }

        let reserved = RESERVED_SERIES
            .iter()
            .filter(|id| **id == SERIES_CANDLES || self.position.is_some())
            .copied();

        if let Some(duplicate) = reserved
            .chain(self.series.iter().map(|spec| spec.id.as_ref()))
            .duplicates()
            .next()
        {
            return Err(ChartError::DuplicateSeries {
                panel: self.name.clone(),
                series: SmolStr::new(duplicate),
            });
        }

        if let Some(field) = self
            .tooltip
            .iter()
            .find(|field| self.series_spec(&field.series).is_none())
        {
            return Err(ChartError::UnknownTooltipSeries {
                panel: self.name.clone(),
                series: field.series.0.clone(),
            });
        }

        Ok(())
    }

    fn check_grid(&self, series: &str, grid: usize) -> Result<(), ChartError> {
        if grid < self.grids.len() {
            Ok(())
        } else {
            Err(ChartError::GridOutOfRange {
                panel: self.name.clone(),
                series: SmolStr::new(series),
                grid,
                grids: self.grids.len(),
            })
        }
    }

    pub fn series_spec(&self, id: &SeriesId) -> Option<&SeriesSpec> {
        self.series.iter().find(|spec| &spec.id == id)
    }

    /// Every column this panel reads, excluding the time column. May contain duplicates.
    pub fn consumed_columns(&self) -> Vec<&str> {
        let candle = [
            self.candle.open.as_str(),
            self.candle.high.as_str(),
            self.candle.low.as_str(),
            self.candle.close.as_str(),
        ];

        let position = self.position.iter().flat_map(|position| {
            [
                position.price.as_str(),
                position.take_profit.as_str(),
                position.stop_loss.as_str(),
            ]
        });

        candle
            .into_iter()
            .chain(self.index_column.as_deref())
            .chain(position)
            .chain(self.series.iter().map(|spec| spec.source.column()))
            .collect()
    }
}

/// Column names of the candle block. Defaults to the conventional `time`, `open`, `high`, `low`
/// and `close`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CandleColumns {
    pub time: SmolStr,
    pub open: SmolStr,
    pub high: SmolStr,
    pub low: SmolStr,
    pub close: SmolStr,
    /// Display name of the candlestick series.
    pub name: SmolStr,
    pub style: CandleStyle,
}

impl Default for CandleColumns {
    fn default() -> Self {
        Self {
            time: SmolStr::new_static("time"),
            open: SmolStr::new_static("open"),
            high: SmolStr::new_static("high"),
            low: SmolStr::new_static("low"),
            close: SmolStr::new_static("close"),
            name: SmolStr::new_static("Candles"),
            style: CandleStyle::default(),
        }
    }
}

/// Sparse position columns drawn over a grid as a gapped position line, entry markers, and
/// take-profit/stop-loss lines.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionOverlay {
    pub price: SmolStr,
    pub take_profit: SmolStr,
    pub stop_loss: SmolStr,
    #[serde(default)]
    pub grid: usize,
}

impl PositionOverlay {
    /// Conventional `additional_*` position columns for the provided timeframe, e.g. "5m".
    pub fn for_timeframe(timeframe: &str) -> Self {
        Self {
            price: format!("additional_position_price_{timeframe}").into(),
            take_profit: format!("additional_takeprofit_{timeframe}").into(),
            stop_loss: format!("additional_stoploss_{timeframe}").into(),
            grid: 0,
        }
    }
}

/// Layout region of one grid, plus how its value axis labels read.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GridLayout {
    pub top: SmolStr,
    pub height: SmolStr,
    #[serde(default)]
    pub axis: AxisKind,
}

impl GridLayout {
    pub fn price(top: &str, height: &str) -> Self {
        Self {
            top: SmolStr::new(top),
            height: SmolStr::new(height),
            axis: AxisKind::Price,
        }
    }

    pub fn value(top: &str, height: &str, format: ValueFormat) -> Self {
        Self {
            top: SmolStr::new(top),
            height: SmolStr::new(height),
            axis: AxisKind::Value(format),
        }
    }
}

/// Value axis flavour of a grid.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    /// Price axis; its pointer label shows the change relative to the base price.
    Price,
    Value(ValueFormat),
}

impl Default for AxisKind {
    fn default() -> Self {
        Self::Value(ValueFormat::Round)
    }
}

/// One line series of a panel.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeriesSpec {
    pub id: SeriesId,
    pub name: SmolStr,
    #[serde(default)]
    pub grid: usize,
    pub source: SeriesSource,
    pub style: LineStyle,
    #[serde(default = "default_true")]
    pub tooltip: bool,
}

impl SeriesSpec {
    pub fn line(id: &str, name: &str, grid: usize, source: SeriesSource, color: &str) -> Self {
        Self {
            id: SeriesId::from(id),
            name: SmolStr::new(name),
            grid,
            source,
            style: LineStyle::solid(color),
            tooltip: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Where the values of a series come from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSource {
    /// Column values as-is.
    Column(SmolStr),
    /// Column values multiplied by a fixed factor.
    Scaled { column: SmolStr, factor: f64 },
}

impl SeriesSource {
    pub fn column(&self) -> &str {
        match self {
            SeriesSource::Column(column) => column.as_str(),
            SeriesSource::Scaled { column, .. } => column.as_str(),
        }
    }

    /// Value of this source at the provided row index. Null stays null.
    pub fn value_at(&self, columns: &AlignedColumns, index: usize) -> Option<f64> {
        let value = columns.value(self.column(), index);
        match self {
            SeriesSource::Column(_) => value,
            SeriesSource::Scaled { factor, .. } => value.map(|value| value * factor),
        }
    }

    /// Build the `(time, value)` series of this source, one [`Point`] per aligned row.
    pub fn build(&self, columns: &AlignedColumns) -> Vec<Point> {
        let points = metric_series(columns.times(), columns.column(self.column()));
        match self {
            SeriesSource::Column(_) => points,
            SeriesSource::Scaled { factor, .. } => scaled_series(&points, *factor),
        }
    }
}

/// One panel metric line of the hover tooltip.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TooltipField {
    pub series: SeriesId,
    pub label: SmolStr,
    #[serde(default)]
    pub format: ValueFormat,
}

impl TooltipField {
    pub fn new(series: &str, label: &str, format: ValueFormat) -> Self {
        Self {
            series: SeriesId::from(series),
            label: SmolStr::new(label),
            format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LineStyle {
    pub color: SmolStr,
    #[serde(default = "default_line_width")]
    pub width: f64,
    #[serde(default)]
    pub dashed: bool,
}

impl LineStyle {
    pub fn solid(color: &str) -> Self {
        Self {
            color: SmolStr::new(color),
            width: default_line_width(),
            dashed: false,
        }
    }

    pub fn dashed(color: &str) -> Self {
        Self {
            dashed: true,
            ..Self::solid(color)
        }
    }
}

fn default_line_width() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CandleStyle {
    pub up: SmolStr,
    pub down: SmolStr,
}

impl Default for CandleStyle {
    fn default() -> Self {
        Self {
            up: SmolStr::new_static("#4CAF50"),
            down: SmolStr::new_static("#FF4D4D"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Field, Frame};

    fn descriptor() -> PanelDescriptor {
        PanelDescriptor {
            name: SmolStr::new("test"),
            candle: CandleColumns::default(),
            index_column: Some(SmolStr::new("index_candle_5m")),
            position: Some(PositionOverlay::for_timeframe("5m")),
            grids: vec![
                GridLayout::price("10", "70%"),
                GridLayout::value("72%", "12%", ValueFormat::Round),
            ],
            series: vec![
                SeriesSpec::line(
                    "level",
                    "Resistance level (5m)",
                    1,
                    SeriesSource::Column(SmolStr::new("metric_resistance_level_5m")),
                    "#AB47BC",
                ),
                SeriesSpec::line(
                    "band",
                    "Band",
                    1,
                    SeriesSource::Scaled {
                        column: SmolStr::new("metric_resistance_level_5m"),
                        factor: 1.05,
                    },
                    "#26C6DA",
                ),
            ],
            tooltip: vec![TooltipField::new("level", "Resistance level", ValueFormat::Round)],
            zoom: None,
        }
    }

    #[test]
    fn test_validate() {
        struct TestCase {
            input: PanelDescriptor,
            expected: Result<(), ChartError>,
        }

        let tests = vec![
            TestCase {
                // TC0: valid descriptor
                input: descriptor(),
                expected: Ok(()),
            },
            TestCase {
                // TC1: no grids
                input: PanelDescriptor {
                    grids: vec![],
                    ..descriptor()
                },
                expected: Err(ChartError::NoGrids {
                    panel: SmolStr::new("test"),
                }),
            },
            TestCase {
                // TC2: series grid out of range
                input: {
                    let mut descriptor = descriptor();
                    descriptor.series[1].grid = 2;
                    descriptor
                },
                expected: Err(ChartError::GridOutOfRange {
                    panel: SmolStr::new("test"),
                    series: SmolStr::new("band"),
                    grid: 2,
                    grids: 2,
                }),
            },
            TestCase {
                // TC3: duplicate series id
                input: {
                    let mut descriptor = descriptor();
                    descriptor.series[1].id = SeriesId::from("level");
                    descriptor
                },
                expected: Err(ChartError::DuplicateSeries {
                    panel: SmolStr::new("test"),
                    series: SmolStr::new("level"),
                }),
            },
            TestCase {
                // TC4: series id collides with the position overlay
                input: {
                    let mut descriptor = descriptor();
                    descriptor.series[0].id = SeriesId::from(SERIES_ENTRY);
                    descriptor.tooltip.clear();
                    descriptor
                },
                expected: Err(ChartError::DuplicateSeries {
                    panel: SmolStr::new("test"),
                    series: SmolStr::new(SERIES_ENTRY),
                }),
            },
            TestCase {
                // TC5: overlay ids are free when there is no position overlay
                input: {
                    let mut descriptor = descriptor();
                    descriptor.position = None;
                    descriptor.series[1].id = SeriesId::from(SERIES_ENTRY);
                    descriptor
                },
                expected: Ok(()),
            },
            TestCase {
                // TC6: tooltip references an unknown series
                input: {
                    let mut descriptor = descriptor();
                    descriptor.tooltip.push(TooltipField::new("rsi", "RSI", ValueFormat::Raw));
                    descriptor
                },
                expected: Err(ChartError::UnknownTooltipSeries {
                    panel: SmolStr::new("test"),
                    series: SmolStr::new("rsi"),
                }),
            },
            TestCase {
                // TC7: non-finite scale factor
                input: {
                    let mut descriptor = descriptor();
                    descriptor.series[1].source = SeriesSource::Scaled {
                        column: SmolStr::new("metric_resistance_level_5m"),
                        factor: f64::INFINITY,
                    };
                    descriptor
                },
                expected: Err(ChartError::InvalidFactor {
                    panel: SmolStr::new("test"),
                    series: SmolStr::new("band"),
                    factor: f64::INFINITY,
                }),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.validate();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_consumed_columns() {
        let descriptor = descriptor();
        let actual = descriptor.consumed_columns();

        assert_eq!(
            actual,
            vec![
                "open",
                "high",
                "low",
                "close",
                "index_candle_5m",
                "additional_position_price_5m",
                "additional_takeprofit_5m",
                "additional_stoploss_5m",
                "metric_resistance_level_5m",
                "metric_resistance_level_5m",
            ]
        );
    }

    #[test]
    fn test_series_source_build_and_value_at_agree() {
        let frame = Frame::new(vec![
            Field::new("time", [Some(1000.0), Some(2000.0), Some(3000.0)]),
            Field::new("metric_resistance_level_5m", [Some(100.0), None, Some(200.0)]),
        ]);
        let columns =
            AlignedColumns::resolve(Some(&frame), "time", ["metric_resistance_level_5m"]).unwrap();
        let source = SeriesSource::Scaled {
            column: SmolStr::new("metric_resistance_level_5m"),
            factor: 0.5,
        };

        let points = source.build(&columns);

        assert_eq!(
            points,
            vec![
                Point(1000, Some(50.0)),
                Point(2000, None),
                Point(3000, Some(100.0)),
            ]
        );
        for (index, point) in points.iter().enumerate() {
            assert_eq!(point.value(), source.value_at(&columns, index), "row {} failed", index);
        }
    }

    #[test]
    fn test_de_panel_descriptor() {
        let input = r##"
            {
                "name": "rsi_1h",
                "index_column": "index_candle_1h",
                "grids": [
                    { "top": "10", "height": "60%", "axis": "price" },
                    { "top": "72%", "height": "20%", "axis": { "value": { "fixed": 1 } } }
                ],
                "series": [
                    {
                        "id": "rsi",
                        "name": "RSI (1h)",
                        "grid": 1,
                        "source": { "column": "metric_rsi_value_1h" },
                        "style": { "color": "#42A5F5" }
                    },
                    {
                        "id": "rsi_high",
                        "name": "RSI band",
                        "grid": 1,
                        "source": { "scaled": { "column": "metric_rsi_value_1h", "factor": 1.1 } },
                        "style": { "color": "#FFA726", "dashed": true },
                        "tooltip": false
                    }
                ],
                "tooltip": [ { "series": "rsi", "label": "RSI", "format": "round" } ]
            }
        "##;

        let actual = PanelDescriptor::from_json(input).unwrap();

        assert_eq!(actual.name, "rsi_1h");
        assert_eq!(actual.candle, CandleColumns::default());
        assert_eq!(actual.grids[1].axis, AxisKind::Value(ValueFormat::Fixed(1)));
        assert_eq!(actual.series[0].style, LineStyle::solid("#42A5F5"));
        assert!(actual.series[0].tooltip);
        assert_eq!(actual.series[1].style, LineStyle::dashed("#FFA726"));
        assert!(!actual.series[1].tooltip);
        assert_eq!(
            actual.series[1].source,
            SeriesSource::Scaled {
                column: SmolStr::new("metric_rsi_value_1h"),
                factor: 1.1
            }
        );
        assert_eq!(actual.tooltip[0].format, ValueFormat::Round);
        assert!(actual.position.is_none());
    }

    #[test]
    fn test_de_panel_descriptor_rejects_invalid() {
        let input = r#"
            {
                "name": "broken",
                "grids": [ { "top": "10", "height": "60%" } ],
                "tooltip": [ { "series": "missing", "label": "Missing" } ]
            }
        "#;

        assert_eq!(
            PanelDescriptor::from_json(input),
            Err(ChartError::UnknownTooltipSeries {
                panel: SmolStr::new("broken"),
                series: SmolStr::new("missing"),
            })
        );
    }
}
