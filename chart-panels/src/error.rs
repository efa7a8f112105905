use smol_str::SmolStr;
use thiserror::Error;

/// All errors generated in `chart-panels`.
///
/// Rendering itself never fails; these only surface when decoding frames or panel descriptors
/// from JSON, or when a descriptor is structurally invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("failed to deserialise JSON input: {0}")]
    Deserialise(String),

    #[error("panel {panel} declares no layout grids")]
    NoGrids { panel: SmolStr },

    #[error("panel {panel} series {series} targets grid {grid}, but only {grids} grids exist")]
    GridOutOfRange {
        panel: SmolStr,
        series: SmolStr,
        grid: usize,
        grids: usize,
    },

    #[error("panel {panel} declares series {series} more than once")]
    DuplicateSeries { panel: SmolStr, series: SmolStr },

    #[error("panel {panel} tooltip field references unknown series {series}")]
    UnknownTooltipSeries { panel: SmolStr, series: SmolStr },

    #[error("panel {panel} series {series} has non-finite scale factor {factor}")]
    InvalidFactor {
        panel: SmolStr,
        series: SmolStr,
        factor: f64,
    },

    #[error("unknown panel: {0}")]
    UnknownPanel(SmolStr),
}

impl From<serde_json::Error> for ChartError {
    fn from(value: serde_json::Error) -> Self {
        Self::Deserialise(value.to_string())
    }
}
