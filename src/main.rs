mod app;
mod color;
mod config;
mod data;
mod error;
mod pipeline;
mod plot;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use config::AnalysisConfig;
use state::ViewerState;

/// Clean a critical-thermal-limit workbook, summarise it per treatment and
/// plot annotated box plots.
#[derive(Parser)]
#[command(name = "thermal-limits")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file overriding the built-in dataset settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Do not open the interactive viewer window
    #[arg(long)]
    no_view: bool,

    /// Do not open the HTML chart in a browser
    #[arg(long)]
    no_open: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    if cli.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let output = pipeline::run(&config, !cli.no_open)?;

    if !cli.no_view {
        let state = ViewerState::new(
            output.model,
            output.stats,
            &config.group_column,
            output.cleaned.len(),
        );
        app::run_viewer(state)?;
    }
    Ok(())
}
