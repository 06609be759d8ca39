use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use serde::Serialize;

use super::model::{CellValue, Dataset};
use crate::error::{DataError, Result};

/// Header names of the statistics columns following the group column.
pub const STAT_COLUMNS: [&str; 4] = ["Mean", "Median", "Std", "Replicates"];

// ---------------------------------------------------------------------------
// Per-group descriptive statistics
// ---------------------------------------------------------------------------

/// Descriptive statistics of one treatment group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub group: CellValue,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1); NaN for fewer than two values.
    pub std: f64,
    /// Rows in the group, including rows with a missing value.
    pub replicates: usize,
}

/// Group `dataset` by `group_column` and summarise `value_column`.
///
/// One record per distinct non-null group value, in ascending key order.
/// Missing values are skipped by mean/median/std but still count as
/// replicates.
pub fn group_statistics(
    dataset: &Dataset,
    group_column: &str,
    value_column: &str,
) -> Result<Vec<GroupStats>> {
    let groups = group_values(dataset, group_column, value_column)?;

    Ok(groups
        .into_iter()
        .map(|(group, (values, replicates))| GroupStats {
            group,
            mean: mean(&values),
            median: median(&values),
            std: sample_std(&values),
            replicates,
        })
        .collect())
}

/// Numeric values per group key, plus the group's row count.
pub fn group_values(
    dataset: &Dataset,
    group_column: &str,
    value_column: &str,
) -> Result<BTreeMap<CellValue, (Vec<f64>, usize)>> {
    let g = dataset.column_index(group_column)?;
    let v = dataset.column_index(value_column)?;

    let mut groups: BTreeMap<CellValue, (Vec<f64>, usize)> = BTreeMap::new();
    for (row_no, row) in dataset.rows.iter().enumerate() {
        if row[g].is_null() {
            continue;
        }
        let value = numeric_cell(&row[v], row_no, value_column)?;
        let entry = groups.entry(row[g].clone()).or_default();
        entry.1 += 1;
        if let Some(x) = value {
            entry.0.push(x);
        }
    }
    Ok(groups)
}

fn numeric_cell(cell: &CellValue, row: usize, column: &str) -> Result<Option<f64>> {
    match cell {
        c if c.is_missing() => Ok(None),
        CellValue::String(s) if s.trim().is_empty() => Ok(None),
        other => other.as_f64().map(Some).ok_or_else(|| DataError::NonNumericValue {
            row,
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    quantile_sorted(&sorted, 0.5)
}

/// Standard deviation with Bessel's correction.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Quantile of already-sorted data, linear interpolation between ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

// ---------------------------------------------------------------------------
// Box-and-whisker summary
// ---------------------------------------------------------------------------

/// Five numbers drawn by a box plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value within 1.5 IQR below Q1.
    pub lower_whisker: f64,
    /// Largest value within 1.5 IQR above Q3.
    pub upper_whisker: f64,
}

impl BoxSummary {
    /// `None` when there is nothing to summarise.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let s = sorted(values);
        let q1 = quantile_sorted(&s, 0.25);
        let q3 = quantile_sorted(&s, 0.75);
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        let lower_whisker = s.iter().copied().find(|&x| x >= lo_fence).unwrap_or(q1);
        let upper_whisker = s.iter().rev().copied().find(|&x| x <= hi_fence).unwrap_or(q3);

        Some(BoxSummary {
            q1,
            median: quantile_sorted(&s, 0.5),
            q3,
            lower_whisker,
            upper_whisker,
        })
    }
}

// ---------------------------------------------------------------------------
// Tabular views
// ---------------------------------------------------------------------------

/// Statistics as an Arrow batch: group column followed by [`STAT_COLUMNS`].
pub fn statistics_batch(stats: &[GroupStats], group_column: &str) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(group_column, DataType::Utf8, false),
        Field::new(STAT_COLUMNS[0], DataType::Float64, true),
        Field::new(STAT_COLUMNS[1], DataType::Float64, true),
        Field::new(STAT_COLUMNS[2], DataType::Float64, true),
        Field::new(STAT_COLUMNS[3], DataType::UInt64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(stats.iter().map(|s| s.group.to_string()))),
        Arc::new(Float64Array::from_iter_values(stats.iter().map(|s| s.mean))),
        Arc::new(Float64Array::from_iter_values(stats.iter().map(|s| s.median))),
        Arc::new(Float64Array::from_iter_values(stats.iter().map(|s| s.std))),
        Arc::new(UInt64Array::from_iter_values(stats.iter().map(|s| s.replicates as u64))),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Console preview of the statistics table.
pub fn format_statistics(stats: &[GroupStats], group_column: &str) -> Result<String> {
    let batch = statistics_batch(stats, group_column)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}
