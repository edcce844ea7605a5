#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Franchise zone analysis over French communes.
//!
//! Loads the commune record store, builds and scores zones, and prints or
//! exports the ranking. Without a subcommand an interactive menu is shown.
//!
//! Logging goes through [`franchise_zones_cli_utils::init_logger`] so log
//! lines and progress bars share the terminal cleanly.

mod commands;
mod interactive;
mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use franchise_zones_zone_models::{ScoreWeights, WeightPreset};

#[derive(Parser)]
#[command(
    name = "franchise_zones",
    about = "Scores market zones of French communes for franchise siting"
)]
struct Cli {
    /// TOML settings file. Top-level keys configure the analysis, the
    /// `[ingest]` table configures data loading
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Data directory holding `raw/` and `cache/` (overrides the config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, score and rank zones
    Analyze(AnalyzeArgs),
    /// Rank individual communes on absolute scales
    Communes {
        /// Number of communes to keep (overrides `communes.limit`)
        #[arg(long)]
        top: Option<usize>,
        /// Write the ranking to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List the weight presets
    Presets,
    /// Parse every source file and refresh the caches
    BuildCache {
        /// Delete existing caches first
        #[arg(long)]
        refresh: bool,
    },
    /// Choose weights and radius from prompts
    Interactive,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Zone radius in kilometres (10 to 50)
    #[arg(long)]
    radius: Option<f64>,
    /// Named weight preset (see `presets`)
    #[arg(long, conflicts_with = "weights", value_parser = parse_preset)]
    preset: Option<WeightPreset>,
    /// Custom weights "housing,income,size" as fractions or percentages
    #[arg(long, value_parser = ScoreWeights::parse_triple)]
    weights: Option<ScoreWeights>,
    /// Minimum households per zone
    #[arg(long)]
    min_households: Option<u64>,
    /// Minimum household-weighted median income per zone
    #[arg(long)]
    min_income: Option<f64>,
    /// Only zones in these regions (comma-separated)
    #[arg(long, value_delimiter = ',')]
    region: Vec<String>,
    /// Only zones in these departments (comma-separated)
    #[arg(long, value_delimiter = ',')]
    department: Vec<String>,
    /// Only zones whose center or a member name contains this text
    #[arg(long)]
    name: Option<String>,
    /// Number of zones printed
    #[arg(long, default_value_t = 20)]
    top: usize,
    /// Print the details of this zone (center commune code)
    #[arg(long)]
    zone: Option<String>,
    /// Write the selected zones to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Write the selected zone centers to this `GeoJSON` file
    #[arg(long)]
    geojson: Option<PathBuf>,
}

fn parse_preset(s: &str) -> Result<WeightPreset, String> {
    s.parse()
        .map_err(|_| format!("unknown preset '{s}', see the `presets` subcommand"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = franchise_zones_cli_utils::init_logger();
    let cli = Cli::parse();

    let settings = commands::Settings::load(cli.config.as_deref(), cli.data_dir)?;

    match cli.command {
        Some(Commands::Analyze(args)) => commands::analyze(&settings, &args, &multi)?,
        Some(Commands::Communes { top, csv }) => {
            commands::communes(&settings, top, csv.as_deref(), &multi)?;
        }
        Some(Commands::Presets) => report::print_presets(),
        Some(Commands::BuildCache { refresh }) => {
            commands::build_cache(&settings, refresh, &multi)?;
        }
        Some(Commands::Interactive) | None => interactive::run(&settings, &multi)?,
    }

    Ok(())
}
