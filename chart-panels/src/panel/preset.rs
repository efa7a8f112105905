use super::{GridLayout, PanelDescriptor, PositionOverlay, SeriesSource, SeriesSpec, TooltipField};
use crate::format::ValueFormat;
use smol_str::SmolStr;

pub const POSITIONS_5M: &str = "positions_5m";
pub const POSITIONS_RESISTANCE_5M: &str = "positions_resistance_5m";
pub const TRIPLE_MA_4H: &str = "triple_ma_4h";

/// Factor and colour of each derived resistance level band, in display order.
const RESISTANCE_BANDS: [(f64, &str); 6] = [
    (0.95, "#26C6DA"),
    (1.05, "#66BB6A"),
    (0.9, "#EF5350"),
    (1.1, "#FFCA28"),
    (0.98, "#42A5F5"),
    (1.02, "#8D6E63"),
];

/// Every built-in [`PanelDescriptor`].
pub fn presets() -> Vec<PanelDescriptor> {
    vec![positions_5m(), positions_resistance_5m(), triple_ma_4h()]
}

/// 5m candles with the position overlay, the 5m resistance level, and the 5m resistance level
/// evaluated on 4h.
pub fn positions_5m() -> PanelDescriptor {
    PanelDescriptor {
        name: SmolStr::new_static(POSITIONS_5M),
        candle: Default::default(),
        index_column: Some(SmolStr::new_static("index_candle_5m")),
        position: Some(PositionOverlay::for_timeframe("5m")),
        grids: vec![
            GridLayout::price("10", "70%"),
            GridLayout::value("72%", "12%", ValueFormat::Round),
            GridLayout::value("86%", "12%", ValueFormat::Round),
        ],
        series: vec![
            SeriesSpec::line(
                "resistance_level",
                "Resistance level (5m)",
                1,
                column("metric_resistance_level_5m"),
                "#AB47BC",
            ),
            SeriesSpec::line(
                "resistance_level_on_4h",
                "Resistance level 5m on 4h",
                2,
                column("metric_resistance_level_5m_on_4h"),
                "#66BB6A",
            ),
        ],
        tooltip: vec![
            TooltipField::new("resistance_level", "Resistance level", ValueFormat::Round),
            TooltipField::new(
                "resistance_level_on_4h",
                "Resistance level 5m on 4h",
                ValueFormat::Round,
            ),
        ],
        zoom: None,
    }
}

/// 5m candles with the position overlay, resistance strength and level, and six bands derived
/// from the resistance level.
pub fn positions_resistance_5m() -> PanelDescriptor {
    let mut grids = vec![
        GridLayout::price("10", "50%"),
        GridLayout::value("52%", "5.5%", ValueFormat::Raw),
    ];
    grids.extend(
        ["58.5%", "65%", "71.5%", "78%", "84.5%"]
            .into_iter()
            .map(|top| GridLayout::value(top, "5.5%", ValueFormat::Round)),
    );
    grids.extend(
        ["91%", "96%"]
            .into_iter()
            .map(|top| GridLayout::value(top, "4%", ValueFormat::Round)),
    );

    let mut series = vec![
        SeriesSpec::line(
            "resistance_strength",
            "Resistance strength (5m)",
            1,
            column("metric_candle_resistance_strength_5m"),
            "#FFA726",
        ),
        SeriesSpec::line(
            "resistance_level",
            "Resistance level (5m)",
            2,
            column("metric_resistance_level_5m"),
            "#AB47BC",
        ),
    ];
    series.extend(
        RESISTANCE_BANDS
            .iter()
            .enumerate()
            .map(|(index, (factor, color))| {
                SeriesSpec::line(
                    &format!("metric_{}", index + 1),
                    &format!("Metric {}", index + 1),
                    index + 3,
                    SeriesSource::Scaled {
                        column: SmolStr::new_static("metric_resistance_level_5m"),
                        factor: *factor,
                    },
                    color,
                )
            }),
    );

    PanelDescriptor {
        name: SmolStr::new_static(POSITIONS_RESISTANCE_5M),
        candle: Default::default(),
        index_column: Some(SmolStr::new_static("index_candle_5m")),
        position: Some(PositionOverlay::for_timeframe("5m")),
        grids,
        series,
        tooltip: vec![
            TooltipField::new("resistance_strength", "Resistance strength", ValueFormat::Raw),
            TooltipField::new("resistance_level", "Resistance level", ValueFormat::Round),
        ],
        zoom: None,
    }
}

/// 4h candles with fast/medium/slow SMA overlays, resistance level, triple-MA value, and the
/// three MA angles.
pub fn triple_ma_4h() -> PanelDescriptor {
    let speeds = [
        ("fast", "Fast", "#42A5F5"),
        ("medium", "Medium", "#66BB6A"),
        ("slow", "Slow", "#FFA726"),
    ];

    let averages = speeds.iter().map(|(speed, title, color)| {
        SeriesSpec::line(
            &format!("ma_{speed}"),
            &format!("Triple MA {title} (4h)"),
            0,
            column(&format!("metric_triple_ma_{speed}_sma_4h")),
            color,
        )
    });

    let angles = speeds.iter().enumerate().map(|(index, (speed, title, color))| {
        SeriesSpec::line(
            &format!("ma_{speed}_angle"),
            &format!("Triple MA {title} angle (4h)"),
            index + 3,
            column(&format!("metric_triple_ma_{speed}_angle_4h")),
            color,
        )
    });

    let series = averages
        .chain([
            SeriesSpec::line(
                "resistance_level",
                "Resistance level (4h)",
                1,
                column("metric_resistance_level_4h"),
                "#AB47BC",
            ),
            SeriesSpec::line(
                "ma_value",
                "Triple MA value (4h)",
                2,
                column("metric_triple_ma_value_4h"),
                "#EC407A",
            ),
        ])
        .chain(angles)
        .collect();

    let tooltip = speeds
        .iter()
        .map(|(speed, title, _)| {
            TooltipField::new(&format!("ma_{speed}"), &format!("MA {title}"), ValueFormat::Fixed(2))
        })
        .chain([
            TooltipField::new("resistance_level", "Resistance level", ValueFormat::Round),
            TooltipField::new("ma_value", "Triple MA value", ValueFormat::Round),
        ])
        .chain(speeds.iter().map(|(speed, title, _)| {
            TooltipField::new(
                &format!("ma_{speed}_angle"),
                &format!("MA {title} angle"),
                ValueFormat::Round,
            )
        }))
        .collect();

    PanelDescriptor {
        name: SmolStr::new_static(TRIPLE_MA_4H),
        candle: Default::default(),
        index_column: Some(SmolStr::new_static("index_candle_4h")),
        position: None,
        grids: vec![
            GridLayout::price("10", "58%"),
            GridLayout::value("70%", "6%", ValueFormat::Round),
            GridLayout::value("78%", "5%", ValueFormat::Round),
            GridLayout::value("84%", "4%", ValueFormat::Round),
            GridLayout::value("89%", "4%", ValueFormat::Round),
            GridLayout::value("94%", "4%", ValueFormat::Round),
        ],
        series,
        tooltip,
        zoom: None,
    }
}

fn column(name: &str) -> SeriesSource {
    SeriesSource::Column(SmolStr::new(name))
}
