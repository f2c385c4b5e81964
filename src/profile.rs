//! Structural and statistical profiling of a [`DataFrame`].
//!
//! The profile is the sole input to the planner: row/column counts,
//! per-column missing counts, exact-duplicate row count, a numeric /
//! categorical / other classification per column, and summary statistics
//! for numeric columns. Profiling never mutates the frame and handles
//! zero-row input by omitting statistics.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    frame::DataFrame,
    schema::{ColumnClass, Schema},
};

/// Summary statistics over the non-missing values of one numeric column.
/// `std` is the sample standard deviation and falls back to `0.0` when
/// fewer than two values exist, so the block always serializes to plain
/// JSON numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumericSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub missing_counts: BTreeMap<String, usize>,
    pub duplicate_row_count: usize,
    pub column_types: BTreeMap<String, ColumnClass>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub numeric_stats: BTreeMap<String, NumericSummary>,
}

impl DatasetProfile {
    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == column)
    }
}

/// Computes the full profile of a frame.
pub fn profile_frame(frame: &DataFrame) -> DatasetProfile {
    let schema: &Schema = frame.schema();
    let columns = schema.headers();

    let mut missing_counts = BTreeMap::new();
    let mut column_types = BTreeMap::new();
    let mut numeric_columns = Vec::new();
    let mut categorical_columns = Vec::new();
    let mut numeric_stats = BTreeMap::new();

    for (idx, column) in schema.columns.iter().enumerate() {
        missing_counts.insert(column.name.clone(), frame.missing_count(idx));
        let class = column.data_type.class();
        column_types.insert(column.name.clone(), class);
        match class {
            ColumnClass::Numeric => {
                numeric_columns.push(column.name.clone());
                let values = frame.numeric_values(idx);
                if !values.is_empty() {
                    numeric_stats.insert(column.name.clone(), summarize(&values));
                }
            }
            ColumnClass::Categorical => categorical_columns.push(column.name.clone()),
            ColumnClass::Other => {}
        }
    }

    DatasetProfile {
        row_count: frame.row_count(),
        column_count: frame.column_count(),
        columns,
        missing_counts,
        duplicate_row_count: count_duplicate_rows(frame),
        column_types,
        numeric_columns,
        categorical_columns,
        numeric_stats,
    }
}

/// Number of rows that exactly match some earlier row; the first
/// occurrence is not counted.
pub fn count_duplicate_rows(frame: &DataFrame) -> usize {
    let mut seen = BTreeSet::new();
    let mut duplicates = 0usize;
    for row in 0..frame.row_count() {
        if !seen.insert(frame.row_key(row)) {
            duplicates += 1;
        }
    }
    duplicates
}

fn summarize(values: &[f64]) -> NumericSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count < 2 {
        0.0
    } else {
        let sum_squares = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
        (sum_squares / (count as f64 - 1.0)).sqrt()
    };
    NumericSummary {
        mean,
        std,
        min: sorted[0],
        max: sorted[count - 1],
        p25: percentile(&sorted, 0.25),
        p75: percentile(&sorted, 0.75),
    }
}

/// Percentile over an ascending-sorted, non-empty slice using linear
/// interpolation between ranks. Shared with the executor so outlier bounds
/// and profile quartiles agree.
pub fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    debug_assert!(!sorted.is_empty(), "percentile of empty slice");
    let rank = fraction * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (rank - lower as f64) * (sorted[upper] - sorted[lower])
    }
}
