//! Column resolution: extracts the columns a panel consumes from a [`Frame`] and aligns them by
//! row index.

use crate::frame::Frame;
use fnv::FnvHashMap;
use smol_str::SmolStr;
use tracing::{debug, warn};

/// Columns of one [`Frame`], aligned by row index and truncated to a common length.
///
/// Absent columns are not stored and read as null at every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedColumns {
    times: Vec<i64>,
    columns: FnvHashMap<SmolStr, Vec<Option<f64>>>,
}

impl AlignedColumns {
    /// Resolve the `time_column` plus every named column from the provided [`Frame`].
    ///
    /// Returns `None` (the empty-result state) if there is no frame or no usable time cell.
    ///
    /// Row count is the valid prefix of the time column (ending at the first null, non-finite or
    /// fractional time cell), truncated to the shortest present column. Ragged columns are
    /// logged, never indexed out of bounds.
    pub fn resolve<'a, Names>(frame: Option<&Frame>, time_column: &str, names: Names) -> Option<Self>
    where
        Names: IntoIterator<Item = &'a str>,
    {
        let Some(frame) = frame else {
            debug!("no frame provided, nothing to resolve");
            return None;
        };

        let raw_times = frame.column(time_column);
        let times = raw_times
            .iter()
            .map_while(|cell| cell.filter(|millis| millis.is_finite() && millis.fract() == 0.0))
            .map(|millis| millis as i64)
            .collect::<Vec<_>>();

        if times.len() < raw_times.len() {
            warn!(
                column = time_column,
                valid = times.len(),
                total = raw_times.len(),
                "time column contains a null or fractional cell, truncating rows"
            );
        }

        let mut len = times.len();
        let mut columns: FnvHashMap<SmolStr, Vec<Option<f64>>> = FnvHashMap::default();

        for name in names {
            if name == time_column || columns.contains_key(name) {
                continue;
            }

            let values = frame.column(name);
            if values.is_empty() {
                continue;
            }

            if values.len() != raw_times.len() {
                warn!(
                    column = name,
                    expected = raw_times.len(),
                    actual = values.len(),
                    "ragged column, truncating to the shortest column"
                );
            }

            len = len.min(values.len());
            columns.insert(SmolStr::new(name), values.to_vec());
        }

        if len == 0 {
            debug!(column = time_column, "time column is empty, nothing to resolve");
            return None;
        }

        let mut times = times;
        times.truncate(len);
        columns.values_mut().for_each(|values| values.truncate(len));

        Some(Self { times, columns })
    }

    /// Number of aligned rows.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Epoch millisecond timestamps, one per row.
    pub fn times(&self) -> &[i64] {
        &self.times
    }

    /// Aligned values of the named column, or an empty slice if the column is absent.
    pub fn column(&self, name: &str) -> &[Option<f64>] {
        self.columns
            .get(name)
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Value of the named column at `index`, or `None` if the column is absent, the cell is null,
    /// or `index` is out of range.
    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.column(name).get(index).copied().flatten()
    }
}
