//! Reduction of a zone's members into zone-level statistics.
//!
//! Counts are summed. Percentages, income and poverty are averaged with
//! each member weighted by its household count, so a hamlet of 100
//! households moves the zone figure a third as much as a town of 300.

use franchise_zones_commune_models::MunicipalityRecord;
use franchise_zones_zone_models::Zone;

use crate::builder::ZoneMembers;

/// Members listed by name before the remainder is summarized.
const NAMED_MEMBERS: usize = 3;

/// Household-weighted mean of `value` over `records`.
///
/// Falls back to the plain mean when every record has zero households.
#[must_use]
pub fn household_weighted_mean<'a>(
    records: impl IntoIterator<Item = &'a MunicipalityRecord>,
    value: impl Fn(&MunicipalityRecord) -> f64,
) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut plain_sum = 0.0;
    let mut count = 0_u32;

    for record in records {
        #[allow(clippy::cast_precision_loss)]
        let weight = record.households as f64;
        let v = value(record);
        weighted_sum += weight * v;
        weight_total += weight;
        plain_sum += v;
        count += 1;
    }

    if weight_total > 0.0 {
        weighted_sum / weight_total
    } else if count > 0 {
        plain_sum / f64::from(count)
    } else {
        0.0
    }
}

/// Builds the display name of a zone from its member names.
///
/// Names are sorted; up to three are listed, the rest summarized as
/// `"+ N autres"`.
#[must_use]
pub fn zone_display_name<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut names: Vec<&str> = names.into_iter().collect();
    names.sort_unstable();

    if names.len() <= NAMED_MEMBERS {
        names.join(", ")
    } else {
        format!(
            "{} + {} autres",
            names[..NAMED_MEMBERS].join(", "),
            names.len() - NAMED_MEMBERS
        )
    }
}

/// Aggregates one zone.
#[must_use]
pub fn aggregate_zone(zone: &ZoneMembers<'_>) -> Zone {
    let records: Vec<&MunicipalityRecord> = zone.members.iter().map(|m| m.record).collect();
    let center = zone.center;

    #[allow(clippy::cast_precision_loss)]
    let count = records.len().max(1) as f64;
    let centroid_latitude = records.iter().map(|r| r.latitude).sum::<f64>() / count;
    let centroid_longitude = records.iter().map(|r| r.longitude).sum::<f64>() / count;

    Zone {
        id: center.code.clone(),
        name: zone_display_name(records.iter().map(|r| r.name.as_str())),
        center_code: center.code.clone(),
        center_name: center.name.clone(),
        center_latitude: center.latitude,
        center_longitude: center.longitude,
        centroid_latitude,
        centroid_longitude,
        members: zone.codes(),
        households: records.iter().map(|r| r.households).sum(),
        population: records.iter().map(|r| r.population).sum(),
        pct_single_family: household_weighted_mean(records.iter().copied(), |r| {
            r.pct_single_family
        }),
        pct_primary_residences: household_weighted_mean(records.iter().copied(), |r| {
            r.pct_primary_residences
        }),
        median_income: household_weighted_mean(records.iter().copied(), |r| r.median_income),
        poverty_rate: household_weighted_mean(records.iter().copied(), |r| r.poverty_rate),
        region: center.region.clone(),
        department: center.department.clone(),
    }
}

/// Aggregates every zone of an assignment, preserving order.
#[must_use]
pub fn aggregate_zones(zones: &[ZoneMembers<'_>]) -> Vec<Zone> {
    let aggregated: Vec<Zone> = zones.iter().map(aggregate_zone).collect();
    log::debug!("Aggregated {} zones", aggregated.len());
    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AssignedMember;
    use crate::test_support::{center, commune};

    fn zone_of<'a>(center: &'a MunicipalityRecord, others: &[&'a MunicipalityRecord]) -> ZoneMembers<'a> {
        let mut members = vec![AssignedMember {
            record: center,
            distance_km: 0.0,
        }];
        members.extend(others.iter().map(|&record| AssignedMember {
            record,
            distance_km: 1.0,
        }));
        members.sort_by(|a, b| a.record.code.cmp(&b.record.code));
        ZoneMembers { center, members }
    }

    #[test]
    fn household_weighted_single_family_share() {
        let mut a = center("17001", 46.0, -1.0);
        a.households = 100;
        a.pct_single_family = 80.0;
        let mut b = commune("17002", 46.01, -1.0);
        b.households = 300;
        b.pct_single_family = 40.0;

        let zone = aggregate_zone(&zone_of(&a, &[&b]));

        assert!((zone.pct_single_family - 50.0).abs() < 1e-9);
        assert_eq!(zone.households, 400);
    }

    #[test]
    fn sums_population_and_inherits_center_geography() {
        let mut a = center("17300", 46.16, -1.15);
        a.population = 75_000;
        a.name = "La Rochelle".to_string();
        let mut b = commune("79001", 46.2, -1.1);
        b.population = 2_000;
        b.department = "79".to_string();
        b.region = "Autre".to_string();

        let zone = aggregate_zone(&zone_of(&a, &[&b]));

        assert_eq!(zone.population, 77_000);
        assert_eq!(zone.id, "17300");
        assert_eq!(zone.center_name, "La Rochelle");
        assert_eq!(zone.department, "17");
        assert_eq!(zone.region, a.region);
        assert_eq!(zone.member_count(), 2);
    }

    #[test]
    fn zero_households_fall_back_to_plain_mean() {
        let mut a = center("17001", 46.0, -1.0);
        a.households = 0;
        a.median_income = 20_000.0;
        let mut b = commune("17002", 46.0, -1.0);
        b.households = 0;
        b.median_income = 30_000.0;

        let zone = aggregate_zone(&zone_of(&a, &[&b]));

        assert!((zone.median_income - 25_000.0).abs() < 1e-9);
        assert!(zone.poverty_rate.is_finite());
    }

    #[test]
    fn single_member_zone_mirrors_center() {
        let a = center("17001", 46.0, -1.0);
        let zone = aggregate_zone(&zone_of(&a, &[]));
        assert_eq!(zone.member_count(), 1);
        assert!((zone.pct_primary_residences - a.pct_primary_residences).abs() < 1e-9);
        assert!((zone.centroid_latitude - a.latitude).abs() < 1e-12);
    }

    #[test]
    fn display_name_lists_three_then_summarizes() {
        assert_eq!(zone_display_name(["Lagord", "Aytré"]), "Aytré, Lagord");
        assert_eq!(
            zone_display_name(["Puilboreau", "Lagord", "Aytré", "Marsilly", "Périgny"]),
            "Aytré, Lagord, Marsilly + 2 autres"
        );
    }
}
