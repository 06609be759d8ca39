use serde::{Deserialize, Serialize};

use super::model::{CellValue, Dataset};
use crate::error::Result;

/// Outcome of dropping sentinel rows.
#[derive(Debug, Clone)]
pub struct CleanReport {
    /// The dataset without the flagged rows.
    pub dataset: Dataset,
    /// How many rows were dropped.
    pub removed: usize,
}

/// Whether a cell's text contains `sentinel` (case-sensitive).
///
/// Non-text scalars are compared through their display form; `Null`
/// never matches.
fn is_flagged(cell: &CellValue, sentinel: &str) -> bool {
    cell.match_text()
        .map(|text| text.contains(sentinel))
        .unwrap_or(false)
}

/// Drop every row whose `column` contains `sentinel` and report the count.
///
/// Prints the human-readable removal line; the returned dataset is a new
/// snapshot, the input is left untouched.
pub fn remove_sentinel_rows(dataset: &Dataset, column: &str, sentinel: &str) -> Result<CleanReport> {
    let idx = dataset.column_index(column)?;

    let cleaned = dataset.retain_rows(|row| !is_flagged(&row[idx], sentinel));
    let removed = dataset.len() - cleaned.len();

    println!("Removing {removed} rows with {sentinel} measurements.");
    log::debug!("{} rows remain after removing '{sentinel}' rows", cleaned.len());

    Ok(CleanReport {
        dataset: cleaned,
        removed,
    })
}

/// A dataset-specific rewrite of one exact label in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCorrection {
    pub column: String,
    pub from: String,
    pub to: String,
}

/// Rewrite cells that equal `correction.from` exactly; returns how many
/// changed. Partial matches are left alone.
pub fn apply_label_correction(dataset: &mut Dataset, correction: &LabelCorrection) -> Result<usize> {
    let idx = dataset.column_index(&correction.column)?;
    let mut rewritten = 0;

    for row in &mut dataset.rows {
        if matches!(&row[idx], CellValue::String(s) if *s == correction.from) {
            row[idx] = CellValue::String(correction.to.clone());
            rewritten += 1;
        }
    }

    if rewritten > 0 {
        log::info!(
            "Corrected {rewritten} '{}' labels to '{}' in column {}",
            correction.from,
            correction.to,
            correction.column
        );
    }
    Ok(rewritten)
}
