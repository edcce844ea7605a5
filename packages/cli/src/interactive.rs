//! Menu-driven analysis using `dialoguer` prompts.

use dialoguer::{Confirm, Input, Select};
use franchise_zones_cli_utils::MultiProgress;
use franchise_zones_zone_models::config::{MAX_ZONE_RADIUS_KM, MIN_ZONE_RADIUS_KM};
use franchise_zones_zone_models::{ScoreWeights, WeightPreset};
use strum::IntoEnumIterator as _;

use crate::commands::{self, Settings};
use crate::report;

/// Top-level actions of the interactive menu.
enum Action {
    AnalyzeZones,
    RankCommunes,
    BuildCaches,
}

impl Action {
    const ALL: &[Self] = &[Self::AnalyzeZones, Self::RankCommunes, Self::BuildCaches];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::AnalyzeZones => "Analyze zones",
            Self::RankCommunes => "Rank communes",
            Self::BuildCaches => "Build data caches",
        }
    }
}

fn prompt_weights() -> Result<ScoreWeights, Box<dyn std::error::Error>> {
    let presets: Vec<WeightPreset> = WeightPreset::iter().collect();
    let mut labels: Vec<String> = presets.iter().map(ToString::to_string).collect();
    labels.push("Custom".to_string());

    let idx = Select::new()
        .with_prompt("Score weights")
        .items(&labels)
        .default(0)
        .interact()?;

    if let Some(preset) = presets.get(idx) {
        return Ok(preset.weights());
    }

    loop {
        let triple: String = Input::new()
            .with_prompt("Housing, income, size percentages")
            .default("40,30,30".to_string())
            .interact_text()?;
        match ScoreWeights::parse_triple(&triple) {
            Ok(weights) => return Ok(weights),
            Err(e) => println!("{e}"),
        }
    }
}

fn prompt_radius(default: f64) -> Result<f64, Box<dyn std::error::Error>> {
    let radius_str: String = Input::new()
        .with_prompt(format!(
            "Zone radius in km ({MIN_ZONE_RADIUS_KM}-{MAX_ZONE_RADIUS_KM})"
        ))
        .default(default.to_string())
        .interact_text()?;

    Ok(radius_str
        .trim()
        .parse::<f64>()
        .unwrap_or(default)
        .clamp(MIN_ZONE_RADIUS_KM, MAX_ZONE_RADIUS_KM))
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub fn run(settings: &Settings, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Franchise zone analysis");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::AnalyzeZones => {
            let records = commands::load_records(settings, multi)?;
            let mut config = settings.analysis.clone();

            loop {
                let weights = prompt_weights()?;
                config.zone_radius_km = prompt_radius(config.zone_radius_km)?;

                let top_str: String = Input::new()
                    .with_prompt("Zones to show")
                    .default("20".to_string())
                    .interact_text()?;
                let top: usize = top_str.trim().parse().unwrap_or(20);

                println!();
                let result = commands::run_and_print(&records, &config, &weights, top)?;

                if !result.is_empty() {
                    let zone_id: String = Input::new()
                        .with_prompt("Zone id for details (empty to skip)")
                        .allow_empty(true)
                        .interact_text()?;
                    if let Some(zone) = result.zone_details(zone_id.trim()) {
                        report::print_zone_details(zone, &records);
                    }
                }

                let again = Confirm::new()
                    .with_prompt("Run again with other settings?")
                    .default(false)
                    .interact()?;
                if !again {
                    break;
                }
            }
        }
        Action::RankCommunes => commands::communes(settings, None, None, multi)?,
        Action::BuildCaches => commands::build_cache(settings, false, multi)?,
    }

    Ok(())
}
