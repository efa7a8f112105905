//! Text formatting of tooltip values, time axis labels, and price axis-pointer labels.

use crate::tooltip::percent_of;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Time axis label format, e.g. "14.11 09:35".
const TIME_LABEL_FORMAT: &str = "%d.%m %H:%M";

/// How a panel metric value is written.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Shortest text that round-trips; integral values have no decimal point.
    #[default]
    Raw,
    /// Nearest integer, halves rounding up.
    Round,
    /// Fixed number of decimals.
    Fixed(u8),
}

impl ValueFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Raw => format_number(value),
            ValueFormat::Round => format_number(round_half_up(value)),
            ValueFormat::Fixed(decimals) => format!("{:.*}", usize::from(*decimals), value),
        }
    }
}

/// Write a number the way a host script would interpolate it: integral values without a decimal
/// point, everything else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Covers -0.0
        "0".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Round to the nearest integer with halves going toward positive infinity, e.g. -2.5 -> -2.
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Two-decimal percentage with an explicit `+` for non-negative values, e.g. "+1.25%".
pub fn format_signed_pct(pct: f64) -> String {
    if pct >= 0.0 {
        format!("+{pct:.2}%")
    } else {
        format!("{pct:.2}%")
    }
}

/// Two-decimal percentage, e.g. "1.25%".
pub fn format_pct(pct: f64) -> String {
    format!("{pct:.2}%")
}

/// Time axis label of an epoch millisecond timestamp (UTC), or `None` if out of range.
pub fn format_time_label(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|time| time.format(TIME_LABEL_FORMAT).to_string())
}

/// Price axis-pointer label relative to the batch base price.
#[derive(Debug, Copy, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PriceLabel {
    pub base_price: Option<f64>,
}

impl PriceLabel {
    pub fn new(base_price: Option<f64>) -> Self {
        Self { base_price }
    }

    /// Change of `price` relative to the base price in percent, if a usable base price exists.
    pub fn relative_pct(&self, price: f64) -> Option<f64> {
        let base = self.base_price?;
        percent_of(price - base, base)
    }

    /// e.g. "101.5  (+1.50%)", or just "101.5" without a usable base price.
    pub fn format(&self, price: f64) -> String {
        match self.relative_pct(price) {
            Some(pct) => format!("{price:.1}  ({})", format_signed_pct(pct)),
            None => format!("{price:.1}"),
        }
    }
}
