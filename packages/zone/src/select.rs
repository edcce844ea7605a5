//! Result filters and summary figures for scored zones.

use std::collections::{BTreeMap, BTreeSet};

use franchise_zones_commune_models::MunicipalityRecord;
use franchise_zones_zone_models::{RegionCount, ScoredZone, ZoneSummary};

/// Narrowing applied to a ranked zone list. Empty sets match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneQuery {
    /// Keep zones whose region is in this set.
    pub regions: BTreeSet<String>,
    /// Keep zones whose department is in this set.
    pub departments: BTreeSet<String>,
    /// Keep zones where the center or any member name contains this text,
    /// ignoring case.
    pub name: Option<String>,
}

impl ZoneQuery {
    /// Whether the query filters nothing out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
            && self.departments.is_empty()
            && self.name.as_deref().is_none_or(|n| n.trim().is_empty())
    }

    fn matches(&self, zone: &ScoredZone, names: &BTreeMap<&str, &str>, needle: Option<&str>) -> bool {
        let zone = &zone.zone;

        if !self.regions.is_empty() && !self.regions.contains(&zone.region) {
            return false;
        }
        if !self.departments.is_empty() && !self.departments.contains(&zone.department) {
            return false;
        }

        needle.is_none_or(|needle| {
            zone.center_name.to_lowercase().contains(needle)
                || zone.members.iter().any(|code| {
                    names
                        .get(code.as_str())
                        .is_some_and(|name| name.to_lowercase().contains(needle))
                })
        })
    }

    /// Keeps the matching zones and re-ranks them from 1.
    ///
    /// `records` supplies member names for the name search.
    #[must_use]
    pub fn apply(&self, zones: &[ScoredZone], records: &[MunicipalityRecord]) -> Vec<ScoredZone> {
        let names: BTreeMap<&str, &str> = records
            .iter()
            .map(|r| (r.code.as_str(), r.name.as_str()))
            .collect();
        let needle = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_lowercase);

        let mut selected: Vec<ScoredZone> = zones
            .iter()
            .filter(|z| self.matches(z, &names, needle.as_deref()))
            .cloned()
            .collect();

        // Input is already in rank order; only the numbering changes.
        for (i, zone) in selected.iter_mut().enumerate() {
            zone.rank = i + 1;
        }

        log::debug!("Zone query kept {} of {} zones", selected.len(), zones.len());
        selected
    }
}

/// Summary figures over a set of scored zones.
#[must_use]
pub fn summarize(zones: &[ScoredZone]) -> ZoneSummary {
    let mut by_region: BTreeMap<&str, usize> = BTreeMap::new();
    for zone in zones {
        *by_region.entry(zone.zone.region.as_str()).or_default() += 1;
    }

    let mut top_regions: Vec<RegionCount> = by_region
        .into_iter()
        .map(|(region, count)| RegionCount {
            region: region.to_string(),
            count,
        })
        .collect();
    top_regions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.region.cmp(&b.region)));

    #[allow(clippy::cast_precision_loss)]
    let mean_score = if zones.is_empty() {
        0.0
    } else {
        zones.iter().map(|z| z.scores.total).sum::<f64>() / zones.len() as f64
    };

    ZoneSummary {
        zone_count: zones.len(),
        mean_score,
        total_households: zones.iter().map(|z| z.zone.households).sum(),
        total_potential_clients: zones.iter().map(|z| z.potential_clients).sum(),
        region_count: top_regions.len(),
        top_regions,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use franchise_zones_zone_models::{Zone, ZoneScores};

    use super::*;
    use crate::test_support::commune;

    fn scored(id: &str, rank: usize, region: &str, department: &str, total: f64) -> ScoredZone {
        ScoredZone {
            rank,
            zone: Zone {
                id: id.to_string(),
                name: id.to_string(),
                center_code: id.to_string(),
                center_name: format!("Centre {id}"),
                center_latitude: 46.0,
                center_longitude: -1.0,
                centroid_latitude: 46.0,
                centroid_longitude: -1.0,
                members: BTreeSet::from([id.to_string(), format!("{id}9")]),
                households: 1_000,
                population: 2_200,
                pct_single_family: 60.0,
                pct_primary_residences: 80.0,
                median_income: 22_000.0,
                poverty_rate: 12.0,
                region: region.to_string(),
                department: department.to_string(),
            },
            scores: ZoneScores {
                housing: total,
                income: total,
                market_size: total,
                total,
            },
            potential_clients: 20.0,
        }
    }

    fn ranked() -> Vec<ScoredZone> {
        vec![
            scored("17001", 1, "Nouvelle-Aquitaine", "17", 90.0),
            scored("44001", 2, "Pays de la Loire", "44", 80.0),
            scored("79001", 3, "Nouvelle-Aquitaine", "79", 70.0),
        ]
    }

    #[test]
    fn empty_query_keeps_everything() {
        let query = ZoneQuery::default();
        assert!(query.is_empty());
        assert_eq!(query.apply(&ranked(), &[]).len(), 3);
    }

    #[test]
    fn region_filter_reranks() {
        let query = ZoneQuery {
            regions: BTreeSet::from(["Nouvelle-Aquitaine".to_string()]),
            ..ZoneQuery::default()
        };
        let kept = query.apply(&ranked(), &[]);
        let ids: Vec<(&str, usize)> = kept.iter().map(|z| (z.zone.id.as_str(), z.rank)).collect();
        assert_eq!(ids, [("17001", 1), ("79001", 2)]);
    }

    #[test]
    fn department_filter() {
        let query = ZoneQuery {
            departments: BTreeSet::from(["44".to_string()]),
            ..ZoneQuery::default()
        };
        let kept = query.apply(&ranked(), &[]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].rank, 1);
    }

    #[test]
    fn name_search_matches_members_case_insensitively() {
        let mut member = commune("790019", 46.3, -0.4);
        member.name = "Échiré".to_string();
        let query = ZoneQuery {
            name: Some("  échiré ".to_string()),
            ..ZoneQuery::default()
        };
        let kept = query.apply(&ranked(), &[member]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].zone.id, "79001");

        let query = ZoneQuery {
            name: Some("centre 44".to_string()),
            ..ZoneQuery::default()
        };
        assert_eq!(query.apply(&ranked(), &[]).len(), 1);
    }

    #[test]
    fn summary_counts_regions() {
        let summary = summarize(&ranked());
        assert_eq!(summary.zone_count, 3);
        assert!((summary.mean_score - 80.0).abs() < 1e-9);
        assert_eq!(summary.total_households, 3_000);
        assert!((summary.total_potential_clients - 60.0).abs() < 1e-9);
        assert_eq!(summary.region_count, 2);
        assert_eq!(
            summary.top_regions[0],
            RegionCount {
                region: "Nouvelle-Aquitaine".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn summary_of_nothing() {
        let summary = summarize(&[]);
        assert_eq!(summary.zone_count, 0);
        assert!(summary.mean_score.abs() < f64::EPSILON);
        assert!(summary.top_regions.is_empty());
    }
}
