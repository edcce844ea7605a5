//! Zone-level retention criteria.

use franchise_zones_zone_models::{Zone, ZoneCriteria};

/// Whether an aggregated zone meets every zone-level threshold.
///
/// Thresholds are inclusive. `min_households` and `min_median_income` are
/// skipped when zero.
#[must_use]
pub fn passes(zone: &Zone, criteria: &ZoneCriteria) -> bool {
    zone.member_count() >= criteria.min_members
        && zone.pct_single_family >= criteria.min_avg_pct_single_family
        && zone.pct_primary_residences >= criteria.min_avg_pct_primary_residences
        && zone.households >= criteria.min_households
        && (criteria.min_median_income <= 0.0 || zone.median_income >= criteria.min_median_income)
}

/// Keeps the zones that pass [`passes`], preserving order.
#[must_use]
pub fn retain_zones(zones: Vec<Zone>, criteria: &ZoneCriteria) -> Vec<Zone> {
    let before = zones.len();
    let retained: Vec<Zone> = zones.into_iter().filter(|z| passes(z, criteria)).collect();

    log::info!(
        "Zone filter: {} of {before} zones retained (>= {} members, >= {}% single-family, >= {}% primary)",
        retained.len(),
        criteria.min_members,
        criteria.min_avg_pct_single_family,
        criteria.min_avg_pct_primary_residences
    );

    retained
}
