use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use marine_dashboard::config::DashboardConfig;
use marine_dashboard::data::export::{export_csv, DEFAULT_EXPORT_NAME};
use marine_dashboard::data::filter::{apply_filters, DateRange, FilterState};
use marine_dashboard::data::loader::load_incidents;
use marine_dashboard::data::normalize::Normalizer;
use marine_dashboard::data::summary::{
    awareness_distribution, monthly_trend, rank_pollution_types, Summary,
};

/// Marine pollution incident dashboard. Without a subcommand the
/// interactive window opens.
#[derive(Debug, Parser)]
#[command(name = "marine-dashboard", version, about)]
pub struct Cli {
    /// Incident data (.xlsx, .xls, .ods, .csv, .json, .parquet)
    #[arg(long, env = "MARINE_DASH_DATA")]
    pub data: Option<PathBuf>,

    /// Worksheet holding the incidents (spreadsheets only)
    #[arg(long, env = "MARINE_DASH_SHEET")]
    pub sheet: Option<String>,

    /// JSON configuration file
    #[arg(long, env = "MARINE_DASH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the filtered incidents as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file
        #[arg(short, long, default_value = DEFAULT_EXPORT_NAME)]
        output: PathBuf,
    },
    /// Print headline counts, top pollution types, monthly trend and
    /// awareness answers
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Only incidents in this country
    #[arg(long)]
    pub country: Option<String>,

    /// Only incidents of this (normalized) pollution type
    #[arg(long)]
    pub pollution_type: Option<String>,

    /// First day of the date range (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the date range (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl FilterArgs {
    /// A single bound selects that one day.
    pub fn to_filter_state(&self) -> FilterState {
        let date_range = match (self.from, self.to) {
            (Some(from), Some(to)) => Some(DateRange::new(from, to)),
            (Some(day), None) | (None, Some(day)) => Some(DateRange::single_day(day)),
            (None, None) => None,
        };
        FilterState {
            country: self.country.clone(),
            pollution_type: self.pollution_type.clone(),
            date_range,
        }
    }
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn resolve_config(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::from_file(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(data) = &self.data {
            config.source.path = data.clone();
        }
        if let Some(sheet) = &self.sheet {
            config.source.sheet = sheet.clone();
        }
        Ok(config)
    }
}

/// Run a headless subcommand.
pub fn run(command: Command, config: &DashboardConfig) -> Result<()> {
    let normalizer =
        Normalizer::new(&config.normalization).context("compiling normalization rules")?;
    let table = load_incidents(&config.source.path, &config.source.sheet, &normalizer)?;

    match command {
        Command::Export { filter, output } => {
            let view = apply_filters(&table, &filter.to_filter_state());
            export_csv(&view, &output)
                .with_context(|| format!("exporting to {}", output.display()))?;
            println!("Wrote {} incidents to {}", view.len(), output.display());
        }
        Command::Summary { filter } => {
            let view = apply_filters(&table, &filter.to_filter_state());
            let summary = Summary::of(&view);
            println!(
                "Incidents: {}  Countries: {}  Pollution types: {}",
                summary.incidents, summary.countries, summary.pollution_types
            );

            let ranking = rank_pollution_types(&view, &table, config.display.top_n);
            if ranking.is_fallback() {
                println!("No incidents match the filters; ranking all data.");
            }
            println!("\n{}", ranking.title());
            for (label, count) in &ranking.entries {
                println!("  {count:>6}  {label}");
            }

            println!("\nIncidents per month");
            for (month, count) in monthly_trend(&view) {
                println!("  {}  {count:>6}", month.format("%Y-%m"));
            }

            if table.has_awareness() {
                println!("\nAwareness answers");
                for (answer, count) in awareness_distribution(&view) {
                    println!("  {count:>6}  {answer}");
                }
            }
        }
    }
    Ok(())
}
