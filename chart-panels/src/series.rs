//! Series assembly from [`AlignedColumns`].
//!
//! Every builder emits exactly one point per aligned row, keeps timestamps untouched, and maps a
//! null cell to an explicit null value so the renderer breaks the line there.

use crate::{column::AlignedColumns, panel::CandleColumns, tooltip::Candle};
use serde::{Deserialize, Serialize, Serializer};

/// `(time, value)` point of a line or scatter series. Serialises as `[time, value]`.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Point(pub i64, pub Option<f64>);

impl Point {
    pub fn time(&self) -> i64 {
        self.0
    }

    pub fn value(&self) -> Option<f64> {
        self.1
    }
}

/// Candlestick point. Serialises as `[time, open, close, low, high]`, the order candlestick
/// renderers expect.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CandlePoint {
    pub time: i64,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl CandlePoint {
    /// The complete [`Candle`], if none of its prices is null.
    pub fn candle(&self) -> Option<Candle> {
        Some(Candle {
            open: self.open?,
            close: self.close?,
            low: self.low?,
            high: self.high?,
        })
    }
}

impl Serialize for CandlePoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.time, self.open, self.close, self.low, self.high).serialize(serializer)
    }
}

/// One [`CandlePoint`] per aligned row, in positional order. Null prices pass through.
pub fn build_candles(columns: &AlignedColumns, names: &CandleColumns) -> Vec<CandlePoint> {
    let open = columns.column(&names.open);
    let close = columns.column(&names.close);
    let low = columns.column(&names.low);
    let high = columns.column(&names.high);

    columns
        .times()
        .iter()
        .enumerate()
        .map(|(index, &time)| CandlePoint {
            time,
            open: cell(open, index),
            close: cell(close, index),
            low: cell(low, index),
            high: cell(high, index),
        })
        .collect()
}

/// Pair every timestamp with the value at the same index. Missing or null cells become explicit
/// null points, never zero and never omitted.
pub fn metric_series(times: &[i64], values: &[Option<f64>]) -> Vec<Point> {
    times
        .iter()
        .enumerate()
        .map(|(index, &time)| Point(time, cell(values, index)))
        .collect()
}

/// Multiply every non-null value by `factor`; nulls and timestamps are preserved.
pub fn scaled_series(source: &[Point], factor: f64) -> Vec<Point> {
    source
        .iter()
        .map(|point| Point(point.time(), point.value().map(|value| value * factor)))
        .collect()
}

/// Reference price for relative percentage display: the last non-null close.
pub fn base_price(closes: &[Option<f64>]) -> Option<f64> {
    closes.iter().rev().find_map(|close| *close)
}

pub(crate) fn cell(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}
