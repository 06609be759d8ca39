use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the data layer (loading, cleaning, aggregation, export).
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    #[error("Sheet not found: {name} (available: {available:?})")]
    SheetNotFound { name: String, available: Vec<String> },

    #[error("Unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("Row {row}, column '{column}': '{value}' is not a number")]
    NonNumericValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row} has {actual} cells but the header has {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
