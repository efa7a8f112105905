//! Hover tooltip resolution.
//!
//! A [`TooltipResolver`] is built once per render. It owns the aligned columns plus typed lookup
//! tables (time -> first row, tooltip field -> value source), so a hover is a hash lookup and a
//! handful of guarded ratios.

use crate::{
    column::AlignedColumns,
    format::{PriceLabel, ValueFormat, format_number, format_pct, format_signed_pct, format_time_label},
    panel::{CandleColumns, PanelDescriptor, SeriesSource},
    series::{base_price, cell},
};
use fnv::FnvHashMap;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;
use tracing::{debug, warn};

/// Separator between tooltip lines.
pub const LINE_BREAK: &str = "<br/>";

/// Complete OHLC candle of one row.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Candle {
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
}

impl Candle {
    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }
}

/// `numerator / denominator * 100`, or `None` for a zero denominator or a non-finite result.
pub(crate) fn percent_of(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }

    let pct = numerator / denominator * 100.0;
    pct.is_finite().then_some(pct)
}

/// Shadow and change percentages of one [`Candle`]. A field is `None` if its guard fails.
#[derive(Debug, Copy, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CandleMetrics {
    /// `(h - l) / l`, iff `l > 0`.
    pub candle_change_pct: Option<f64>,
    /// `(c - o) / o`, iff `o > 0`.
    pub body_change_pct: Option<f64>,
    /// `(h - prev_h) / prev_h`, iff `prev_h > 0`.
    pub high_change_pct: Option<f64>,
    /// `(h - body_top) / body_top`, iff `h > body_top`.
    pub upper_shadow_pct: Option<f64>,
    /// `(body_bottom - l) / body_bottom`, iff `body_bottom > l`.
    pub lower_shadow_pct: Option<f64>,
}

impl CandleMetrics {
    pub fn compute(candle: &Candle, prev_high: Option<f64>) -> Self {
        let Candle {
            open,
            close,
            low,
            high,
        } = *candle;
        let top = candle.body_top();
        let bottom = candle.body_bottom();

        Self {
            candle_change_pct: guarded(low > 0.0, high - low, low),
            body_change_pct: guarded(open > 0.0, close - open, open),
            high_change_pct: prev_high
                .and_then(|prev_high| guarded(prev_high > 0.0, high - prev_high, prev_high)),
            upper_shadow_pct: guarded(high > top, high - top, top),
            lower_shadow_pct: guarded(bottom > low, bottom - low, bottom),
        }
    }

    /// Display lines, in the order candle change, body change, high vs previous high, upper
    /// shadow, lower shadow. Absent fields produce no line.
    pub fn lines(&self) -> Vec<String> {
        [
            self.candle_change_pct
                .map(|pct| format!("Candle change: {}", format_pct(pct))),
            self.body_change_pct
                .map(|pct| format!("Body change: {}", format_signed_pct(pct))),
            self.high_change_pct
                .map(|pct| format!("High vs Prev High: {}", format_signed_pct(pct))),
            self.upper_shadow_pct
                .map(|pct| format!("Upper shadow: {}", format_pct(pct))),
            self.lower_shadow_pct
                .map(|pct| format!("Lower shadow: {}", format_pct(pct))),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn guarded(condition: bool, numerator: f64, denominator: f64) -> Option<f64> {
    condition.then(|| percent_of(numerator, denominator)).flatten()
}

/// Hover context handed over by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Hover {
    /// Hovered timestamp in epoch milliseconds.
    #[serde(default, deserialize_with = "de_hover_time")]
    pub time: Option<i64>,
    /// Axis label the renderer already formatted for `time`.
    #[serde(default)]
    pub label: Option<String>,
}

impl Hover {
    pub fn at(time: i64) -> Self {
        Self {
            time: Some(time),
            label: None,
        }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    /// The provided axis label, else the hovered timestamp formatted as a time axis label.
    pub fn axis_label(&self) -> Option<String> {
        match &self.label {
            Some(label) if !label.is_empty() => Some(label.clone()),
            Some(_) => None,
            None => self.time.and_then(format_time_label),
        }
    }
}

/// Deserialise a hover time from an integral JSON number, in integer (`1000`) or float (`1000.0`)
/// notation. Fractional times match no row and are rejected.
fn de_hover_time<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    number
        .as_i64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|millis| millis.is_finite() && millis.fract() == 0.0)
                .map(|millis| millis as i64)
        })
        .map(Some)
        .ok_or_else(|| {
            serde::de::Error::custom(format!(
                "hover time must be integral epoch milliseconds, got {number}"
            ))
        })
}

/// Labelled panel metric value of one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipValue {
    pub label: SmolStr,
    pub format: ValueFormat,
    pub value: Option<f64>,
}

/// Everything the tooltip shows for one resolved row.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TooltipFrame {
    /// Resolved row of the aligned columns.
    pub row: usize,
    /// Upstream candle index, if the panel has an index column.
    pub index: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub prev_high: Option<f64>,
    /// Present iff all four prices of the row are non-null.
    pub metrics: Option<CandleMetrics>,
    pub values: Vec<TooltipValue>,
}

impl TooltipFrame {
    /// Row lines in display order: index, OHLC, change/shadow metrics, then panel metrics.
    pub fn lines(&self) -> Vec<String> {
        let index = self
            .index
            .map(|index| format!("index: {}", format_number(index)));

        let prices = [
            ("O", self.open),
            ("H", self.high),
            ("L", self.low),
            ("C", self.close),
        ]
        .into_iter()
        .filter_map(|(name, price)| price.map(|price| format!("{name}: {price:.4}")));

        let metrics = self
            .metrics
            .as_ref()
            .map(CandleMetrics::lines)
            .unwrap_or_default();

        let values = self.values.iter().filter_map(|value| {
            value
                .value
                .map(|inner| format!("{}: {}", value.label, value.format.format(inner)))
        });

        index
            .into_iter()
            .chain(prices)
            .chain(metrics)
            .chain(values)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ResolvedField {
    label: SmolStr,
    format: ValueFormat,
    source: SeriesSource,
}

/// Resolves a [`Hover`] into tooltip lines for one rendered panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TooltipResolver {
    columns: AlignedColumns,
    time_index: FnvHashMap<i64, usize>,
    candle: CandleColumns,
    index_column: Option<SmolStr>,
    fields: Vec<ResolvedField>,
    price_label: PriceLabel,
}

impl TooltipResolver {
    /// Build the lookup tables for the provided [`PanelDescriptor`] and its [`AlignedColumns`].
    ///
    /// Duplicate timestamps resolve to their first row.
    pub fn new(descriptor: &PanelDescriptor, columns: AlignedColumns) -> Self {
        let mut time_index = FnvHashMap::with_capacity_and_hasher(columns.len(), Default::default());
        for (row, &time) in columns.times().iter().enumerate() {
            time_index.entry(time).or_insert(row);
        }

        if time_index.len() < columns.len() {
            debug!(
                panel = %descriptor.name,
                rows = columns.len(),
                unique = time_index.len(),
                "duplicate timestamps, hovers resolve to the first row"
            );
        }

        let series = descriptor
            .series
            .iter()
            .map(|spec| (&spec.id, spec))
            .collect::<FnvHashMap<_, _>>();

        let fields = descriptor
            .tooltip
            .iter()
            .filter_map(|field| match series.get(&field.series) {
                Some(spec) => Some(ResolvedField {
                    label: field.label.clone(),
                    format: field.format,
                    source: spec.source.clone(),
                }),
                None => {
                    warn!(
                        panel = %descriptor.name,
                        series = %field.series,
                        "tooltip field references an unknown series, skipping"
                    );
                    None
                }
            })
            .collect();

        let price_label = PriceLabel::new(base_price(columns.column(&descriptor.candle.close)));

        Self {
            columns,
            time_index,
            candle: descriptor.candle.clone(),
            index_column: descriptor.index_column.clone(),
            fields,
            price_label,
        }
    }

    /// Resolver of an empty panel: every hover yields the axis label only.
    pub fn empty() -> Self {
        Self::default()
    }

    /// First row whose timestamp equals `time`.
    pub fn locate(&self, time: i64) -> Option<usize> {
        self.time_index.get(&time).copied()
    }

    /// Tooltip content of the provided row, or `None` if the row is out of range.
    pub fn frame_at(&self, row: usize) -> Option<TooltipFrame> {
        if row >= self.columns.len() {
            return None;
        }

        let open = self.columns.value(&self.candle.open, row);
        let high = self.columns.value(&self.candle.high, row);
        let low = self.columns.value(&self.candle.low, row);
        let close = self.columns.value(&self.candle.close, row);

        let prev_high = row
            .checked_sub(1)
            .and_then(|prev| cell(self.columns.column(&self.candle.high), prev));

        let metrics = match (open, close, low, high) {
            (Some(open), Some(close), Some(low), Some(high)) => Some(CandleMetrics::compute(
                &Candle {
                    open,
                    close,
                    low,
                    high,
                },
                prev_high,
            )),
            _ => None,
        };

        let values = self
            .fields
            .iter()
            .map(|field| TooltipValue {
                label: field.label.clone(),
                format: field.format,
                value: field.source.value_at(&self.columns, row),
            })
            .collect();

        Some(TooltipFrame {
            row,
            index: self
                .index_column
                .as_ref()
                .and_then(|column| self.columns.value(column, row)),
            open,
            high,
            low,
            close,
            prev_high,
            metrics,
            values,
        })
    }

    /// Tooltip lines for the provided [`Hover`]: the axis label, then the row lines if the
    /// hovered timestamp exists in the time column.
    pub fn lines(&self, hover: &Hover) -> Vec<String> {
        let rows = hover
            .time
            .and_then(|time| self.locate(time))
            .and_then(|row| self.frame_at(row))
            .map(|frame| frame.lines())
            .unwrap_or_default();

        hover.axis_label().into_iter().chain(rows).collect()
    }

    /// Tooltip lines joined with [`LINE_BREAK`].
    pub fn text(&self, hover: &Hover) -> String {
        self.lines(hover).into_iter().join(LINE_BREAK)
    }

    /// Price axis-pointer label relative to the base price of this render.
    pub fn price_label(&self, price: f64) -> String {
        self.price_label.format(price)
    }

    pub fn base_price(&self) -> Option<f64> {
        self.price_label.base_price
    }
}
