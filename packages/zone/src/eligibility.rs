//! Center and member selection.
//!
//! Splits the record store into zone *centers* (population at or above the
//! center threshold) and *eligible members* (housing, occupancy and
//! household thresholds met). A record can be both. Both lists are sorted
//! by commune code so downstream stages never depend on input order.

use franchise_zones_commune_models::MunicipalityRecord;
use franchise_zones_zone_models::{AnalysisConfig, EligibilityCriteria};

/// The two labeled subsets produced by [`classify`].
#[derive(Debug, Clone, Default)]
pub struct Eligibility<'a> {
    /// Municipalities that anchor a zone, sorted by code.
    pub centers: Vec<&'a MunicipalityRecord>,
    /// Municipalities assignable to a zone, sorted by code.
    pub members: Vec<&'a MunicipalityRecord>,
}

/// Whether a municipality meets the member thresholds.
#[must_use]
pub fn is_eligible_member(record: &MunicipalityRecord, criteria: &EligibilityCriteria) -> bool {
    record.pct_single_family >= criteria.min_pct_single_family
        && record.pct_primary_residences >= criteria.min_pct_primary_residences
        && record.households >= criteria.min_households
}

/// Whether a municipality is populous enough to anchor a zone.
#[must_use]
pub const fn is_center(record: &MunicipalityRecord, config: &AnalysisConfig) -> bool {
    record.population >= config.center_min_population
}

/// Selects eligible members, sorted by code.
#[must_use]
pub fn eligible_members<'a>(
    records: &'a [MunicipalityRecord],
    criteria: &EligibilityCriteria,
) -> Vec<&'a MunicipalityRecord> {
    let mut members: Vec<&MunicipalityRecord> = records
        .iter()
        .filter(|r| is_eligible_member(r, criteria))
        .collect();
    members.sort_by(|a, b| a.code.cmp(&b.code));
    members
}

/// Selects zone centers, sorted by code.
///
/// If no municipality reaches the population threshold, the
/// `fallback_center_count` most populous eligible members are used instead
/// (population descending, code ascending on ties).
#[must_use]
pub fn centers<'a>(
    records: &'a [MunicipalityRecord],
    members: &[&'a MunicipalityRecord],
    config: &AnalysisConfig,
) -> Vec<&'a MunicipalityRecord> {
    let mut centers: Vec<&MunicipalityRecord> =
        records.iter().filter(|r| is_center(r, config)).collect();

    if centers.is_empty() && config.fallback_center_count > 0 && !members.is_empty() {
        log::warn!(
            "No municipality has population >= {}; falling back to the {} most populous eligible municipalities",
            config.center_min_population,
            config.fallback_center_count
        );
        let mut by_population = members.to_vec();
        by_population.sort_by(|a, b| {
            b.population
                .cmp(&a.population)
                .then_with(|| a.code.cmp(&b.code))
        });
        by_population.truncate(config.fallback_center_count);
        centers = by_population;
    }

    centers.sort_by(|a, b| a.code.cmp(&b.code));
    centers
}

/// Splits the store into centers and eligible members.
#[must_use]
pub fn classify<'a>(records: &'a [MunicipalityRecord], config: &AnalysisConfig) -> Eligibility<'a> {
    let members = eligible_members(records, &config.eligibility);
    let centers = centers(records, &members, config);

    log::info!(
        "Eligibility: {} records, {} eligible members, {} centers",
        records.len(),
        members.len(),
        centers.len()
    );

    Eligibility { centers, members }
}
