mod app;
mod cli;
mod color;
mod state;
mod ui;

use anyhow::{anyhow, Context, Result};
use app::DashboardApp;
use clap::Parser;
use eframe::egui;
use marine_dashboard::config::DashboardConfig;
use marine_dashboard::data::normalize::Normalizer;
use state::AppState;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = cli::Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Some(command) => cli::run(command, &config),
        None => run_window(config),
    }
}

fn run_window(config: DashboardConfig) -> Result<()> {
    let normalizer =
        Normalizer::new(&config.normalization).context("compiling normalization rules")?;
    let mut state = AppState::new(config, normalizer);
    state.load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Marine Pollution Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("running dashboard window: {e}"))
}
