//! Plain-text tables printed by the subcommands.

use franchise_zones_commune_models::MunicipalityRecord;
use franchise_zones_zone::PipelineStats;
use franchise_zones_zone_models::{RankedCommune, ScoredZone, WeightPreset, ZoneSummary};
use strum::IntoEnumIterator as _;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

pub fn print_stats(stats: &PipelineStats, national_median_income: f64) {
    println!(
        "{} communes, {} eligible, {} centers, {} assigned, {} out of range",
        stats.records, stats.eligible_members, stats.centers, stats.assigned, stats.unassigned
    );
    println!(
        "{} zones built, {} scored (national median income {national_median_income:.0} EUR)",
        stats.zones_built, stats.zones_scored
    );
    println!();
}

pub fn print_summary(summary: &ZoneSummary) {
    println!(
        "Zones: {}   Mean score: {:.1}   Households: {}   Potential clients: {:.0}",
        summary.zone_count,
        summary.mean_score,
        summary.total_households,
        summary.total_potential_clients
    );
    if !summary.top_regions.is_empty() {
        let regions: Vec<String> = summary
            .top_regions
            .iter()
            .take(5)
            .map(|r| format!("{} ({})", r.region, r.count))
            .collect();
        println!(
            "Regions: {} of which top {}",
            summary.region_count,
            regions.join(", ")
        );
    }
    println!();
}

pub fn print_zone_table(zones: &[ScoredZone]) {
    println!(
        "{:>4}  {:<40} {:<24} {:>4} {:>9} {:>8} {:>7} {:>7} {:>7} {:>7}",
        "RANK", "ZONE", "REGION", "N", "MENAGES", "CLIENTS", "LOGT", "REVENU", "TAILLE", "TOTAL"
    );
    println!("{}", "-".repeat(136));
    for scored in zones {
        let zone = &scored.zone;
        println!(
            "{:>4}  {:<40} {:<24} {:>4} {:>9} {:>8.0} {:>7.1} {:>7.1} {:>7.1} {:>7.1}",
            scored.rank,
            truncate(&zone.name, 40),
            truncate(&zone.region, 24),
            zone.member_count(),
            zone.households,
            scored.potential_clients,
            scored.scores.housing,
            scored.scores.income,
            scored.scores.market_size,
            scored.scores.total,
        );
    }
}

pub fn print_zone_details(scored: &ScoredZone, records: &[MunicipalityRecord]) {
    let zone = &scored.zone;
    println!("Zone {} (rank {})", zone.id, scored.rank);
    println!("  Center:      {} ({})", zone.center_name, zone.center_code);
    println!("  Region:      {} / {}", zone.region, zone.department);
    println!(
        "  Location:    {:.4}, {:.4} (centroid {:.4}, {:.4})",
        zone.center_latitude, zone.center_longitude, zone.centroid_latitude, zone.centroid_longitude
    );
    println!(
        "  Households:  {}   Population: {}   Potential clients: {:.0}",
        zone.households, zone.population, scored.potential_clients
    );
    println!(
        "  Housing:     {:.1}% houses, {:.1}% primary residences",
        zone.pct_single_family, zone.pct_primary_residences
    );
    println!(
        "  Income:      {:.0} EUR median, {:.1}% poverty",
        zone.median_income, zone.poverty_rate
    );
    println!(
        "  Scores:      housing {:.1}, income {:.1}, size {:.1}, total {:.1}",
        scored.scores.housing, scored.scores.income, scored.scores.market_size, scored.scores.total
    );
    println!("  Members:");
    for record in records.iter().filter(|r| zone.members.contains(&r.code)) {
        println!(
            "    {:<6} {:<32} {:>7} households",
            record.code,
            truncate(&record.name, 32),
            record.households
        );
    }
    println!();
}

pub fn print_commune_table(communes: &[RankedCommune]) {
    println!(
        "{:>4}  {:<6} {:<32} {:<24} {:>8} {:>8} {:>7} {:>7} {:>7} {:>7}",
        "RANK", "CODE", "COMMUNE", "REGION", "MENAGES", "CLIENTS", "LOGT", "REVENU", "TAILLE", "TOTAL"
    );
    println!("{}", "-".repeat(128));
    for ranked in communes {
        let record = &ranked.record;
        println!(
            "{:>4}  {:<6} {:<32} {:<24} {:>8} {:>8} {:>7.1} {:>7.1} {:>7.1} {:>7.1}",
            ranked.rank,
            record.code,
            truncate(&record.name, 32),
            truncate(&record.region, 24),
            record.households,
            ranked.potential_clients,
            ranked.scores.housing,
            ranked.scores.income,
            ranked.scores.market_size,
            ranked.scores.total,
        );
    }
}

pub fn print_presets() {
    println!("{:<16} {:<26} HOUSING/INCOME/SIZE", "KEY", "NAME");
    println!("{}", "-".repeat(64));
    for preset in WeightPreset::iter() {
        let (housing, income, size) = preset.percentages();
        let key = preset_key(preset);
        let name = preset.to_string();
        println!("{key:<16} {name:<26} {housing}/{income}/{size}");
    }
}

/// The value accepted by `--preset` for this preset.
pub const fn preset_key(preset: WeightPreset) -> &'static str {
    match preset {
        WeightPreset::Classique => "classique",
        WeightPreset::Equilibre => "equilibre",
        WeightPreset::FocusLogement => "focus-logement",
        WeightPreset::FocusRevenus => "focus-revenus",
        WeightPreset::FocusTaille => "focus-taille",
        WeightPreset::Marche => "marche",
    }
}
