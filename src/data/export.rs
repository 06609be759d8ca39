use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};

use super::model::{CellValue, Dataset};
use super::stats::{GroupStats, STAT_COLUMNS};
use crate::error::Result;

/// Sheet name used for exported tables.
pub const EXPORT_SHEET: &str = "Sheet1";

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        // Missing values become empty cells
        CellValue::Null => {}
        CellValue::Float(f) if f.is_nan() => {}
        CellValue::Float(f) => {
            sheet.write_number(row, col, *f)?;
        }
        // Excel stores all numbers as f64
        CellValue::Integer(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        CellValue::String(s) | CellValue::Date(s) => {
            sheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

fn write_table<R>(path: &Path, header: &[&str], rows: R) -> Result<()>
where
    R: IntoIterator<Item = Vec<CellValue>>,
{
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET)?;

    for (col, name) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    for (r, row) in rows.into_iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            write_cell(sheet, r as u32 + 1, c as u16, cell)?;
        }
    }

    workbook.save(path)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Save a dataset as a single-sheet workbook: header row, then data, no
/// index column.
pub fn write_dataset_xlsx(dataset: &Dataset, path: &Path) -> Result<()> {
    let header: Vec<&str> = dataset.column_names.iter().map(String::as_str).collect();
    write_table(path, &header, dataset.rows.iter().cloned())
}

/// Save the statistics table: `group_column`, Mean, Median, Std, Replicates.
pub fn write_statistics_xlsx(stats: &[GroupStats], group_column: &str, path: &Path) -> Result<()> {
    let mut header = vec![group_column];
    header.extend(STAT_COLUMNS);

    let rows = stats.iter().map(|s| {
        vec![
            s.group.clone(),
            CellValue::Float(s.mean),
            CellValue::Float(s.median),
            CellValue::Float(s.std),
            CellValue::Integer(s.replicates as i64),
        ]
    });
    write_table(path, &header, rows)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::data::clean::remove_sentinel_rows;
    use crate::data::fixtures::sample;
    use crate::data::loader::load_sheet;
    use crate::data::stats::group_statistics;

    #[test]
    fn cleaned_dataset_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ct_cleaned.xlsx");
        let cleaned = remove_sentinel_rows(&sample(), "Specimen_ID", "blank")
            .unwrap()
            .dataset;

        write_dataset_xlsx(&cleaned, &path).unwrap();
        let (info, reloaded) = load_sheet(&path, EXPORT_SHEET, None).unwrap();

        assert_eq!(info.sheet_names, vec![EXPORT_SHEET]);
        assert_eq!(reloaded, cleaned);
    }

    #[test]
    fn statistics_sheet_has_blank_std_for_singletons() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ct_stats.xlsx");
        let cleaned = remove_sentinel_rows(&sample(), "Specimen_ID", "blank")
            .unwrap()
            .dataset;
        let stats = group_statistics(&cleaned, "Treat", "CT1").unwrap();

        write_statistics_xlsx(&stats, "Treat", &path).unwrap();
        let (_, table) = load_sheet(&path, EXPORT_SHEET, None).unwrap();

        assert_eq!(table.column_names, vec!["Treat", "Mean", "Median", "Std", "Replicates"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1][0], CellValue::from("H"));
        assert_eq!(table.rows[1][3], CellValue::Null);
        assert_eq!(table.rows[1][4].as_f64(), Some(1.0));
    }
}
