//! Subcommand implementations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use franchise_zones_cli_utils::{MultiProgress, TerminalProgress};
use franchise_zones_commune_models::MunicipalityRecord;
use franchise_zones_ingest::{DataLoader, IngestConfig};
use franchise_zones_zone::select::ZoneQuery;
use franchise_zones_zone::{AnalysisResult, communes::rank_communes, run_analysis, select};
use franchise_zones_zone_models::{AnalysisConfig, ScoreWeights, WeightPreset};

use crate::AnalyzeArgs;
use crate::report;

/// Analysis and ingestion settings for one invocation.
pub struct Settings {
    pub analysis: AnalysisConfig,
    pub ingest: IngestConfig,
}

impl Settings {
    /// Reads both sections from `config` when given, else uses defaults.
    pub fn load(
        config: Option<&Path>,
        data_dir: Option<PathBuf>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (analysis, mut ingest) = match config {
            Some(path) => {
                log::info!("Loading settings from {}", path.display());
                (AnalysisConfig::load(path)?, IngestConfig::load(path)?)
            }
            None => (AnalysisConfig::default(), IngestConfig::default()),
        };

        if let Some(dir) = data_dir {
            ingest.data_dir = dir;
        }

        Ok(Self { analysis, ingest })
    }
}

/// Loads the record store behind a spinner.
pub fn load_records(
    settings: &Settings,
    multi: &MultiProgress,
) -> Result<Vec<MunicipalityRecord>, Box<dyn std::error::Error>> {
    let loader = DataLoader::new(settings.ingest.clone());
    let progress = TerminalProgress::spinner(multi, "Loading commune records");
    let records = loader.records();
    progress.finish_and_clear();

    let records = records?;
    log::info!("{} commune records loaded", records.len());
    Ok(records)
}

/// Runs the pipeline and prints the ranking.
pub fn run_and_print(
    records: &[MunicipalityRecord],
    config: &AnalysisConfig,
    weights: &ScoreWeights,
    top: usize,
) -> Result<AnalysisResult, Box<dyn std::error::Error>> {
    println!(
        "Radius {} km, weights housing {:.0}% / income {:.0}% / size {:.0}%",
        config.zone_radius_km,
        weights.housing * 100.0,
        weights.income * 100.0,
        weights.size * 100.0
    );

    let result = run_analysis(records, config, weights)?;
    report::print_stats(&result.stats, result.national_median_income);

    if result.is_empty() {
        println!("No zone meets the criteria. Lower the thresholds or widen the radius.");
    } else {
        report::print_summary(&result.summary());
        report::print_zone_table(result.top(top));
    }

    Ok(result)
}

pub fn analyze(
    settings: &Settings,
    args: &AnalyzeArgs,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = settings.analysis.clone();
    if let Some(radius) = args.radius {
        config.zone_radius_km = radius;
    }
    if let Some(households) = args.min_households {
        config.zone_criteria.min_households = households;
    }
    if let Some(income) = args.min_income {
        config.zone_criteria.min_median_income = income;
    }

    let weights = args
        .weights
        .or_else(|| args.preset.map(WeightPreset::weights))
        .unwrap_or_default();

    // Fail before touching the data.
    weights.validate()?;
    config.validate()?;

    let records = load_records(settings, multi)?;

    let query = ZoneQuery {
        regions: args.region.iter().cloned().collect::<BTreeSet<_>>(),
        departments: args.department.iter().cloned().collect::<BTreeSet<_>>(),
        name: args.name.clone(),
    };

    let zones = if query.is_empty() {
        let result = run_and_print(&records, &config, &weights, args.top)?;
        if let Some(id) = &args.zone {
            match result.zone_details(id) {
                Some(zone) => report::print_zone_details(zone, &records),
                None => println!("No scored zone with id {id}"),
            }
        }
        result.zones
    } else {
        let result = run_analysis(&records, &config, &weights)?;
        report::print_stats(&result.stats, result.national_median_income);

        let selected = query.apply(&result.zones, &records);
        println!("{} of {} zones match the filters", selected.len(), result.zones.len());
        if !selected.is_empty() {
            report::print_summary(&select::summarize(&selected));
            report::print_zone_table(&selected[..args.top.min(selected.len())]);
        }
        if let Some(id) = &args.zone {
            match selected.iter().find(|z| &z.zone.id == id) {
                Some(zone) => report::print_zone_details(zone, &records),
                None => println!("No selected zone with id {id}"),
            }
        }
        selected
    };

    if let Some(path) = &args.csv {
        franchise_zones_export::write_zones_csv_file(path, &zones)?;
        println!("Zones written to {}", path.display());
    }
    if let Some(path) = &args.geojson {
        franchise_zones_export::write_zones_geojson_file(path, &zones)?;
        println!("Zone centers written to {}", path.display());
    }

    Ok(())
}

pub fn communes(
    settings: &Settings,
    top: Option<usize>,
    csv: Option<&Path>,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ranking = settings.analysis.communes.clone();
    if let Some(limit) = top {
        ranking.limit = limit;
    }

    let records = load_records(settings, multi)?;
    let ranked = rank_communes(&records, &ranking, settings.analysis.conversion_rate)?;

    if ranked.is_empty() {
        println!("No commune meets the ranking thresholds.");
    } else {
        report::print_commune_table(&ranked);
    }

    if let Some(path) = csv {
        franchise_zones_export::write_communes_csv_file(path, &ranked)?;
        println!("Communes written to {}", path.display());
    }

    Ok(())
}

pub fn build_cache(
    settings: &Settings,
    refresh: bool,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let loader = DataLoader::new(settings.ingest.clone());
    println!("Raw data:  {}", loader.paths().raw_dir().display());
    println!("Cache:     {}", loader.paths().cache_dir().display());

    if refresh {
        let removed = loader.cache().clear()?;
        println!("Removed {removed} cache files");
    }

    let progress = TerminalProgress::steps_bar(multi, "Building caches", 4);
    let reports = loader.build_caches(progress.as_ref())?;

    println!();
    println!("{:<16} {:>10}  SOURCE", "DATASET", "ROWS");
    println!("{}", "-".repeat(40));
    for r in &reports {
        println!(
            "{:<16} {:>10}  {}",
            r.name,
            r.rows,
            if r.cached { "cache" } else { "parsed" }
        );
    }

    Ok(())
}
