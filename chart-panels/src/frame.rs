//! Input data model handed over by the upstream data source.
//!
//! Mirrors the host's data-frame JSON shape:
//! `{"series": [{"fields": [{"name": "time", "values": [...]}, ...]}]}`.

use crate::error::ChartError;
use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;

/// Query result for one panel. Only the first [`Frame`] is charted.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PanelData {
    #[serde(default)]
    pub series: Vec<Frame>,
}

impl PanelData {
    /// Decode a [`PanelData`] from the host JSON shape.
    pub fn from_json(input: &str) -> Result<Self, ChartError> {
        serde_json::from_str(input).map_err(ChartError::from)
    }

    /// The [`Frame`] that gets charted, if the query returned any.
    pub fn frame(&self) -> Option<&Frame> {
        self.series.first()
    }
}

/// Named columns of one query result. Columns are positionally aligned by row index.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Frame {
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Frame {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Values of the first field called `name`, or an empty slice if there is no such field.
    ///
    /// An absent column means "no data", never a fault.
    pub fn column(&self, name: &str) -> &[Option<f64>] {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }
}

/// One named column.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Field {
    pub name: SmolStr,
    #[serde(default, deserialize_with = "de_lenient_values")]
    pub values: Vec<Option<f64>>,
}

impl Field {
    pub fn new<Values>(name: impl Into<SmolStr>, values: Values) -> Self
    where
        Values: IntoIterator<Item = Option<f64>>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }
}

/// Deserialise a column leniently: numbers and numeric strings become values, everything else
/// (null, booleans, free text, nested objects) becomes null.
fn de_lenient_values<'de, D>(deserializer: D) -> Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .map(lenient_value)
        .collect())
}

fn lenient_value(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}
