//! Position overlay derivation from sparse position columns.
//!
//! A position interval is a maximal run of non-null position prices. Its first row is the entry.
//! Exits are not emitted; the null gap after an interval is the exit.

use crate::{
    column::AlignedColumns,
    panel::PositionOverlay,
    series::{Point, cell},
};

/// Position line, entry markers, and take-profit/stop-loss lines of one panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionSeries {
    /// One point per row; null where no position is open.
    pub line: Vec<Point>,
    /// One point per position interval, at the interval's first row.
    pub entries: Vec<Point>,
    pub take_profit: Vec<Point>,
    pub stop_loss: Vec<Point>,
}

impl PositionSeries {
    /// Derive the [`PositionSeries`] for the columns named by the provided [`PositionOverlay`].
    pub fn from_columns(columns: &AlignedColumns, overlay: &PositionOverlay) -> Self {
        derive_position(
            columns.times(),
            columns.column(&overlay.price),
            columns.column(&overlay.take_profit),
            columns.column(&overlay.stop_loss),
        )
    }
}

/// Derive position series from parallel columns aligned with `times`.
///
/// Row `i` is an entry iff `price[i]` is present and `price[i - 1]` is null, where the row
/// before the first is null. Take-profit and stop-loss are passed through independently and are
/// not checked against the position interval.
pub fn derive_position(
    times: &[i64],
    price: &[Option<f64>],
    take_profit: &[Option<f64>],
    stop_loss: &[Option<f64>],
) -> PositionSeries {
    let mut series = PositionSeries {
        line: Vec::with_capacity(times.len()),
        entries: Vec::new(),
        take_profit: Vec::with_capacity(times.len()),
        stop_loss: Vec::with_capacity(times.len()),
    };

    let mut prev = None;
    for (index, &time) in times.iter().enumerate() {
        let current = cell(price, index);

        if let (Some(entry), None) = (current, prev) {
            series.entries.push(Point(time, Some(entry)));
        }

        series.line.push(Point(time, current));
        series.take_profit.push(Point(time, cell(take_profit, index)));
        series.stop_loss.push(Point(time, cell(stop_loss, index)));

        prev = current;
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Field, Frame};

    #[test]
    fn test_derive_position_entries() {
        struct TestCase {
            price: Vec<Option<f64>>,
            expected: Vec<Point>,
        }

        let tests = vec![
            TestCase {
                // TC0: one entry per maximal non-null run
                price: vec![None, Some(5.0), Some(5.0), None, Some(7.0), None],
                expected: vec![Point(1, Some(5.0)), Point(4, Some(7.0))],
            },
            TestCase {
                // TC1: position open from the first row is an entry
                price: vec![Some(3.0), Some(3.0), None],
                expected: vec![Point(0, Some(3.0))],
            },
            TestCase {
                // TC2: single-bar position still yields exactly one entry
                price: vec![None, Some(4.0), None, None],
                expected: vec![Point(1, Some(4.0))],
            },
            TestCase {
                // TC3: price change inside a run is not a new entry
                price: vec![Some(3.0), Some(3.5), Some(4.0)],
                expected: vec![Point(0, Some(3.0))],
            },
            TestCase {
                // TC4: no position at all
                price: vec![None, None],
                expected: vec![],
            },
            TestCase {
                // TC5: absent position column
                price: vec![],
                expected: vec![],
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let times = (0..6).collect::<Vec<i64>>();
            let actual = derive_position(&times, &test.price, &[], &[]);
            assert_eq!(actual.entries, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_derive_position_lines_keep_gaps() {
        let times = [10, 20, 30, 40];
        let price = [None, Some(5.0), Some(5.0), None];
        let take_profit = [None, Some(6.0), Some(6.0), Some(6.5)];
        let stop_loss = [Some(4.0), Some(4.5), None, None];

        let actual = derive_position(&times, &price, &take_profit, &stop_loss);

        assert_eq!(
            actual.line,
            vec![Point(10, None), Point(20, Some(5.0)), Point(30, Some(5.0)), Point(40, None)]
        );
        // Take-profit present while no position is open is passed through, not an error
        assert_eq!(
            actual.take_profit,
            vec![Point(10, None), Point(20, Some(6.0)), Point(30, Some(6.0)), Point(40, Some(6.5))]
        );
        assert_eq!(
            actual.stop_loss,
            vec![Point(10, Some(4.0)), Point(20, Some(4.5)), Point(30, None), Point(40, None)]
        );
        assert_eq!(actual.entries, vec![Point(20, Some(5.0))]);
    }

    #[test]
    fn test_position_series_from_columns() {
        let frame = Frame::new(vec![
            Field::new("time", [Some(1000.0), Some(2000.0), Some(3000.0)]),
            Field::new("additional_position_price_5m", [Some(100.0), None, Some(101.0)]),
            Field::new("additional_stoploss_5m", [Some(95.0), None, Some(96.0)]),
        ]);
        let overlay = PositionOverlay::for_timeframe("5m");
        let columns = AlignedColumns::resolve(
            Some(&frame),
            "time",
            [
                overlay.price.as_str(),
                overlay.take_profit.as_str(),
                overlay.stop_loss.as_str(),
            ],
        )
        .unwrap();

        let actual = PositionSeries::from_columns(&columns, &overlay);

        assert_eq!(
            actual.entries,
            vec![Point(1000, Some(100.0)), Point(3000, Some(101.0))]
        );
        assert_eq!(actual.line.len(), 3);
        assert!(actual.take_profit.iter().all(|point| point.value().is_none()));
        assert_eq!(actual.stop_loss[2], Point(3000, Some(96.0)));
    }
}
