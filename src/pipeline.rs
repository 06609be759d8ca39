use anyhow::{Context, Result};

use crate::config::AnalysisConfig;
use crate::data::clean::{apply_label_correction, remove_sentinel_rows};
use crate::data::export::{write_dataset_xlsx, write_statistics_xlsx};
use crate::data::loader::load_sheet;
use crate::data::model::Dataset;
use crate::data::stats::{format_statistics, group_statistics, GroupStats};
use crate::plot::{html, render, ChartModel};

/// What a run produced, kept around for the viewer.
pub struct RunOutput {
    pub cleaned: Dataset,
    pub stats: Vec<GroupStats>,
    pub model: ChartModel,
}

/// Load, clean and summarise; no files are written.
pub fn analyse(config: &AnalysisConfig) -> Result<(Dataset, Vec<GroupStats>)> {
    let (info, raw) = load_sheet(
        &config.input_path,
        &config.sheet_name,
        config.use_columns.as_deref(),
    )
    .with_context(|| format!("loading {}", config.input_path.display()))?;
    log::debug!("{} has sheets {:?}", info.path.display(), info.sheet_names);

    let report = remove_sentinel_rows(&raw, &config.identifier_column, &config.sentinel)?;
    log::debug!(
        "{} of {} rows dropped by sentinel '{}'",
        report.removed,
        raw.len(),
        config.sentinel
    );
    let mut cleaned = report.dataset;
    if cleaned.is_empty() {
        log::warn!("No rows left in {} after cleaning", config.input_path.display());
    }

    for correction in &config.label_corrections {
        apply_label_correction(&mut cleaned, correction)?;
    }
    let treatments: Vec<String> = cleaned
        .unique_values(&config.group_column)?
        .iter()
        .map(ToString::to_string)
        .collect();
    log::debug!("Treatments after label correction: {treatments:?}");

    let stats = group_statistics(&cleaned, &config.group_column, &config.value_column)?;
    println!("\n Calculated statistics:");
    println!("{}", format_statistics(&stats, &config.group_column)?);

    Ok((cleaned, stats))
}

/// The full run: analyse, draw both chart variants, export both tables.
pub fn run(config: &AnalysisConfig, open_html: bool) -> Result<RunOutput> {
    let (cleaned, stats) = analyse(config)?;

    let model = ChartModel::build(
        &cleaned,
        &stats,
        &config.group_column,
        &config.value_column,
        &config.chart,
    )?;

    render::write_png(&model, &config.chart, &config.figure_path)?;

    let svg_chart = render::render_svg(&model, &config.chart)?;
    let document = html::build_document(&model, &stats, &config.group_column, &svg_chart)?;
    html::write_html(&document, &config.html_path, open_html)?;

    write_statistics_xlsx(&stats, &config.group_column, &config.stats_path)
        .with_context(|| format!("writing {}", config.stats_path.display()))?;
    write_dataset_xlsx(&cleaned, &config.cleaned_path)
        .with_context(|| format!("writing {}", config.cleaned_path.display()))?;

    Ok(RunOutput {
        cleaned,
        stats,
        model,
    })
}

#[cfg(test)]
mod tests {
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    use super::*;
    use crate::data::model::CellValue;

    #[test]
    fn analyse_cleans_corrects_and_groups() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("ct.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("dt_MO2_messy").unwrap();
        let rows = [
            ("S1", "C", Some(30.1)),
            ("S2", "HT_HC", Some(27.0)),
            ("blank_3", "C", None),
            ("S4", "HT-HC", Some(26.0)),
            ("S5", "HT_HCX", Some(25.0)),
        ];
        for (col, name) in ["Specimen_ID", "Treat", "CT1", "Notes"].iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        for (i, (id, treat, ct)) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, *id).unwrap();
            sheet.write_string(r, 1, *treat).unwrap();
            if let Some(v) = ct {
                sheet.write_number(r, 2, *v).unwrap();
            }
            sheet.write_string(r, 3, "note").unwrap();
        }
        workbook.save(&input).unwrap();

        let config = AnalysisConfig {
            input_path: input,
            ..AnalysisConfig::default()
        };
        let (cleaned, stats) = analyse(&config).unwrap();

        assert_eq!(cleaned.column_names, vec!["Specimen_ID", "Treat", "CT1"]);
        assert_eq!(cleaned.len(), 4);
        let groups: Vec<CellValue> = stats.iter().map(|s| s.group.clone()).collect();
        let expected: Vec<CellValue> = vec!["C".into(), "HT-HC".into(), "HT_HCX".into()];
        assert_eq!(groups, expected);
        assert_eq!(stats[1].replicates, 2);
        assert_eq!(stats[1].mean, 26.5);
    }
}
