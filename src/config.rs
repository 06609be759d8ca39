use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::clean::LabelCorrection;

// ---------------------------------------------------------------------------
// Analysis configuration
// ---------------------------------------------------------------------------

/// Everything a run needs. `Default` reproduces the CT "deadly trio"
/// dataset; a JSON file may override any subset of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub input_path: PathBuf,
    pub sheet_name: String,
    /// Columns to load; `None` loads all of them.
    pub use_columns: Option<Vec<String>>,
    /// Column whose text may contain the sentinel.
    pub identifier_column: String,
    pub sentinel: String,
    pub group_column: String,
    pub value_column: String,
    pub label_corrections: Vec<LabelCorrection>,

    pub stats_path: PathBuf,
    pub cleaned_path: PathBuf,
    pub figure_path: PathBuf,
    pub html_path: PathBuf,

    pub chart: ChartConfig,
}

/// Presentation settings shared by the static and interactive charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: String,
    /// Explicit left-to-right treatment order; `None` follows the
    /// statistics table.
    pub treatment_order: Option<Vec<String>>,
    /// Treatment code → human-readable name, in legend order.
    pub display_names: Vec<DisplayName>,
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayName {
    pub code: String,
    pub name: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("CT_deadlytrio.xlsx"),
            sheet_name: "dt_MO2_messy".to_string(),
            use_columns: Some(vec![
                "Specimen_ID".to_string(),
                "Treat".to_string(),
                "CT1".to_string(),
            ]),
            identifier_column: "Specimen_ID".to_string(),
            sentinel: "blank".to_string(),
            group_column: "Treat".to_string(),
            value_column: "CT1".to_string(),
            label_corrections: vec![LabelCorrection {
                column: "Treat".to_string(),
                from: "HT_HC".to_string(),
                to: "HT-HC".to_string(),
            }],
            stats_path: PathBuf::from("ct_stats.xlsx"),
            cleaned_path: PathBuf::from("ct_cleaned.xlsx"),
            figure_path: PathBuf::from("ct_deadly_trio.png"),
            html_path: PathBuf::from("int_plot_deadlytrio.html"),
            chart: ChartConfig::default(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        let names = [
            ("C", "Control"),
            ("H", "Hypoxia"),
            ("HC", "High Carbon"),
            ("HC-H", "High Carbon + Hypoxia"),
            ("HT", "High Temperature"),
            ("HT-H", "High Temperature + Hypoxia"),
            ("HT-HC", "High Temperature + High Carbon"),
            ("HT-HC-H", "High Temperature + High Carbon + Hypoxia (Deadly trio)"),
        ];
        Self {
            title: "Effect of the 'deadly trio' on the critical thermal limit of anemones".to_string(),
            x_label: "Treatment".to_string(),
            y_label: "Critical thermal limit (°C)".to_string(),
            legend_title: "Treatment".to_string(),
            treatment_order: None,
            display_names: names
                .iter()
                .map(|(code, name)| DisplayName {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            width_in: 16.0,
            height_in: 14.0,
            dpi: 300,
        }
    }
}

impl ChartConfig {
    /// Human-readable name of a treatment code, or the code itself.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        match self.display_names.iter().find(|d| d.code == code) {
            Some(d) => &d.name,
            None => {
                log::debug!("No display name for treatment '{code}', using the raw label");
                code
            }
        }
    }

    /// Figure size in pixels at the configured DPI.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }
}

impl AnalysisConfig {
    /// Read a JSON config; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
