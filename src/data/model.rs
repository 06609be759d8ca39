use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{DataError, Result};

/// A dynamically-typed cell mirroring what a workbook can hold.
///
/// Group keys live in a `BTreeMap` downstream, so cells are totally
/// ordered. Equality, ordering and hashing all agree: floats compare by
/// `total_cmp`, so `NaN == NaN` and `-0.0 != 0.0`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text.
    Date(String),
    Null,
}

impl CellValue {
    /// Sort rank of the variant; cells of different kinds never tie.
    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) => 2,
            CellValue::Float(_) => 3,
            CellValue::String(_) => 4,
            CellValue::Date(_) => 5,
        }
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Float(a), CellValue::Float(b)) => a.total_cmp(b),
            (CellValue::String(a), CellValue::String(b))
            | (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            // total_cmp equality is bit equality
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl CellValue {
    /// Interpret the value as an `f64`. `Null` is not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text used for substring matching.
    ///
    /// Scalars are coerced to their display form; `Null` has no text and
    /// therefore never matches anything.
    pub fn match_text(&self) -> Option<String> {
        match self {
            CellValue::String(s) | CellValue::Date(s) => Some(s.clone()),
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Whether the cell holds a missing value (`Null` or a NaN float).
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – one loaded sheet
// ---------------------------------------------------------------------------

/// A row of cells, positionally aligned with [`Dataset::column_names`].
pub type Row = Vec<CellValue>;

/// A rectangular table: named columns and rows of cells.
///
/// Operations that change the rows return a new `Dataset`, so a cleaned
/// snapshot can be shared by the aggregation and plotting stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Ordered column names, as in the source header.
    pub column_names: Vec<String>,
    /// Data rows (header excluded).
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset, checking every row against the header width.
    pub fn new(column_names: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let expected = column_names.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(DataError::RowLength {
                row,
                expected,
                actual: r.len(),
            });
        }
        Ok(Dataset { column_names, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.column_names
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DataError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    /// Iterate the cells of one column.
    pub fn column<'a>(&'a self, name: &str) -> Result<impl Iterator<Item = &'a CellValue> + 'a> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Sorted set of distinct values in a column.
    pub fn unique_values(&self, name: &str) -> Result<BTreeSet<CellValue>> {
        Ok(self.column(name)?.cloned().collect())
    }

    /// A new dataset holding only the rows for which `keep` returns true.
    pub fn retain_rows<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&Row) -> bool,
    {
        Dataset {
            column_names: self.column_names.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Restrict to the given columns, keeping the source column order.
    pub fn select_columns(&self, wanted: &[String]) -> Result<Dataset> {
        for name in wanted {
            self.column_index(name)?;
        }
        let keep: Vec<usize> = self
            .column_names
            .iter()
            .enumerate()
            .filter(|(_, c)| wanted.contains(c))
            .map(|(i, _)| i)
            .collect();

        Ok(Dataset {
            column_names: keep.iter().map(|&i| self.column_names[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }
}
