use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatchReader;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CellValue, Dataset, Row};
use crate::error::{DataError, Result};

/// What the loader saw of the source file besides the requested sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookInfo {
    pub path: PathBuf,
    /// Sheet names in workbook order. Single-table formats report one
    /// pseudo-sheet named after the file stem.
    pub sheet_names: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one sheet of a workbook, optionally restricted to `use_columns`.
/// Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – the named sheet
/// * `.csv`     – header row + records, `sheet_name` is ignored
/// * `.parquet` – flat scalar columns, `sheet_name` is ignored
///
/// The first row is the header. Rows whose cells are all empty are skipped.
pub fn load_sheet(
    path: &Path,
    sheet_name: &str,
    use_columns: Option<&[String]>,
) -> Result<(WorkbookInfo, Dataset)> {
    // Surface a plain "not found" before any format-specific parser does.
    std::fs::metadata(path)?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (info, dataset) = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, sheet_name)?,
        "csv" => {
            log::debug!("{} has no sheets, ignoring '{sheet_name}'", path.display());
            (single_table_info(path), load_csv(path)?)
        }
        "parquet" | "pq" => {
            log::debug!("{} has no sheets, ignoring '{sheet_name}'", path.display());
            (single_table_info(path), load_parquet(path)?)
        }
        other => return Err(DataError::UnsupportedExtension(other.to_string())),
    };

    let dataset = match use_columns {
        Some(cols) => dataset.select_columns(cols)?,
        None => dataset,
    };

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        dataset.len(),
        dataset.column_names,
        path.display()
    );
    Ok((info, dataset))
}

fn single_table_info(path: &Path) -> WorkbookInfo {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    WorkbookInfo {
        path: path.to_path_buf(),
        sheet_names: vec![stem],
    }
}

/// Turn a header row plus data rows into a [`Dataset`].
///
/// Blank header cells get positional names; all-empty data rows are dropped.
fn assemble(header: Vec<CellValue>, body: impl Iterator<Item = Row>) -> Result<Dataset> {
    let column_names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, h)| match h {
            CellValue::Null => format!("Unnamed: {i}"),
            other => other.to_string(),
        })
        .collect();

    let width = column_names.len();
    let rows: Vec<Row> = body
        .filter(|r| !r.iter().all(CellValue::is_null))
        .map(|mut r| {
            r.resize(width, CellValue::Null);
            r
        })
        .collect();

    Dataset::new(column_names, rows)
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

fn load_workbook(path: &Path, sheet_name: &str) -> Result<(WorkbookInfo, Dataset)> {
    let workbook_error = |e: calamine::Error| DataError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
    let sheet_names = workbook.sheet_names().to_vec();
    if !sheet_names.iter().any(|s| s == sheet_name) {
        return Err(DataError::SheetNotFound {
            name: sheet_name.to_string(),
            available: sheet_names,
        });
    }

    let range = workbook.worksheet_range(sheet_name).map_err(workbook_error)?;
    let mut rows = range.rows().map(|r| r.iter().map(data_to_cell).collect::<Row>());
    let header = rows.next().unwrap_or_default();
    let dataset = assemble(header, rows)?;

    let info = WorkbookInfo {
        path: path.to_path_buf(),
        sheet_names,
    };
    Ok((info, dataset))
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Serial date (days since 1899-12-30)
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        // #N/A, #DIV/0! and friends read as missing
        Data::Error(_) => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut records = reader.records();
    let header: Row = match records.next() {
        Some(record) => record?
            .iter()
            .map(|h| {
                if h.is_empty() {
                    CellValue::Null
                } else {
                    CellValue::String(h.to_string())
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let body = records
        .map(|record| record.map(|r| r.iter().map(guess_cell_type).collect::<Row>()))
        .collect::<std::result::Result<Vec<Row>, csv::Error>>()?;

    assemble(header, body.into_iter())
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns (strings, ints, floats,
/// bools). Works with files written by both Pandas and Polars.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let column_names: Vec<String> = reader
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let mut rows: Vec<Row> = Vec::new();
    for batch in reader {
        let batch = batch?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell_value(col, row))
                    .collect(),
            );
        }
    }

    let header = column_names.into_iter().map(CellValue::String).collect();
    assemble(header, rows.into_iter())
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    use super::*;

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("dt_MO2_messy").unwrap();
        sheet.write_string(0, 0, "Specimen_ID").unwrap();
        sheet.write_string(0, 1, "Treat").unwrap();
        sheet.write_string(0, 2, "CT1").unwrap();
        sheet.write_string(0, 3, "Notes").unwrap();
        sheet.write_string(1, 0, "A1").unwrap();
        sheet.write_string(1, 1, "C").unwrap();
        sheet.write_number(1, 2, 30.5).unwrap();
        sheet.write_string(1, 3, "ok").unwrap();
        sheet.write_string(2, 0, "blank 1").unwrap();
        sheet.write_string(2, 1, "C").unwrap();
        workbook.add_worksheet().set_name("other").unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn loads_named_sheet_with_column_subset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ct.xlsx");
        write_workbook(&path);

        let cols = vec!["CT1".to_string(), "Specimen_ID".to_string()];
        let (info, ds) = load_sheet(&path, "dt_MO2_messy", Some(&cols)).unwrap();

        assert_eq!(info.sheet_names, vec!["dt_MO2_messy", "other"]);
        assert_eq!(ds.column_names, vec!["Specimen_ID", "CT1"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0][1], CellValue::Float(30.5));
        assert_eq!(ds.rows[1][1], CellValue::Null);
    }

    #[test]
    fn unknown_sheet_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ct.xlsx");
        write_workbook(&path);

        let err = load_sheet(&path, "nope", None).unwrap_err();
        assert!(matches!(err, DataError::SheetNotFound { ref name, .. } if name == "nope"));
    }

    #[test]
    fn missing_allowlisted_column_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ct.xlsx");
        write_workbook(&path);

        let cols = vec!["CT2".to_string()];
        let err = load_sheet(&path, "dt_MO2_messy", Some(&cols)).unwrap_err();
        assert!(matches!(err, DataError::ColumnNotFound { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_sheet(Path::new("/definitely/not/here.xlsx"), "s", None).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ct.txt");
        std::fs::write(&path, "x").unwrap();
        let err = load_sheet(&path, "s", None).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedExtension(ref e) if e == "txt"));
    }

    #[test]
    fn csv_types_are_guessed_and_blank_lines_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ct.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Specimen_ID,Treat,CT1").unwrap();
        writeln!(f, "S1,C,30.1").unwrap();
        writeln!(f, ",,").unwrap();
        writeln!(f, "17,H,29").unwrap();
        drop(f);

        let (info, ds) = load_sheet(&path, "ignored", None).unwrap();
        assert_eq!(info.sheet_names, vec!["ct"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[1][0], CellValue::Integer(17));
        assert_eq!(ds.rows[1][2], CellValue::Integer(29));
    }

    #[test]
    fn parquet_flat_columns_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ct.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("Treat", DataType::Utf8, false),
            Field::new("CT1", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["C", "H"])),
                Arc::new(Float64Array::from(vec![Some(30.0), None])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let (_, ds) = load_sheet(&path, "ignored", None).unwrap();
        assert_eq!(ds.column_names, vec!["Treat", "CT1"]);
        assert_eq!(ds.rows[0], vec![CellValue::from("C"), CellValue::Float(30.0)]);
        assert_eq!(ds.rows[1][1], CellValue::Null);
    }
}
