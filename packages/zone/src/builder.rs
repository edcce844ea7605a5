//! Nearest-center zone assignment.
//!
//! Every center anchors its own zone and is one of its members. Every other
//! eligible municipality joins the zone of the nearest center within the
//! radius, or stays unassigned. Ties between equidistant centers go to the
//! lowest center code.

use std::collections::{BTreeMap, BTreeSet};

use franchise_zones_commune_models::MunicipalityRecord;

use crate::eligibility::Eligibility;
use crate::index::CenterIndex;

/// A member of a zone together with its distance to the center.
#[derive(Debug, Clone, Copy)]
pub struct AssignedMember<'a> {
    /// The member record.
    pub record: &'a MunicipalityRecord,
    /// Haversine distance to the center in kilometers (0 for the center).
    pub distance_km: f64,
}

/// The municipalities grouped under one center, before aggregation.
#[derive(Debug, Clone)]
pub struct ZoneMembers<'a> {
    /// The anchoring center.
    pub center: &'a MunicipalityRecord,
    /// Members sorted by code, including the center itself.
    pub members: Vec<AssignedMember<'a>>,
}

impl ZoneMembers<'_> {
    /// Member codes as a set.
    #[must_use]
    pub fn codes(&self) -> BTreeSet<String> {
        self.members.iter().map(|m| m.record.code.clone()).collect()
    }
}

/// Result of one zone-building pass.
#[derive(Debug, Clone, Default)]
pub struct ZoneAssignment<'a> {
    /// One entry per center, sorted by center code.
    pub zones: Vec<ZoneMembers<'a>>,
    /// Eligible non-center municipalities with no center in range, sorted by code.
    pub unassigned: Vec<&'a MunicipalityRecord>,
}

impl ZoneAssignment<'_> {
    /// Number of non-center municipalities that joined a zone.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.zones.iter().map(|z| z.members.len() - 1).sum()
    }
}

/// Partitions eligible members among centers.
#[must_use]
pub fn build_zones<'a>(eligibility: &Eligibility<'a>, radius_km: f64) -> ZoneAssignment<'a> {
    let index = CenterIndex::new(&eligibility.centers);

    let mut by_center: BTreeMap<&str, ZoneMembers<'a>> = eligibility
        .centers
        .iter()
        .map(|&center| {
            (
                center.code.as_str(),
                ZoneMembers {
                    center,
                    members: vec![AssignedMember {
                        record: center,
                        distance_km: 0.0,
                    }],
                },
            )
        })
        .collect();

    let mut unassigned = Vec::new();

    for &record in &eligibility.members {
        if by_center.contains_key(record.code.as_str()) {
            continue;
        }

        match index.nearest_within(record.latitude, record.longitude, radius_km) {
            Some(hit) => {
                if let Some(zone) = by_center.get_mut(hit.center.code.as_str()) {
                    zone.members.push(AssignedMember {
                        record,
                        distance_km: hit.distance_km,
                    });
                }
            }
            None => unassigned.push(record),
        }
    }

    let zones: Vec<ZoneMembers<'a>> = by_center
        .into_values()
        .map(|mut zone| {
            zone.members.sort_by(|a, b| a.record.code.cmp(&b.record.code));
            zone
        })
        .collect();

    let assignment = ZoneAssignment { zones, unassigned };

    log::info!(
        "Zone builder: {} zones, {} municipalities assigned, {} out of range (radius {radius_km} km)",
        assignment.zones.len(),
        assignment.assigned_count(),
        assignment.unassigned.len()
    );

    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::distance_between;
    use crate::test_support::{center, commune, offset_east_km, offset_north_km};

    fn split<'a>(
        centers: &[&'a MunicipalityRecord],
        members: &[&'a MunicipalityRecord],
    ) -> Eligibility<'a> {
        let mut centers = centers.to_vec();
        centers.sort_by(|a, b| a.code.cmp(&b.code));
        let mut members = members.to_vec();
        members.sort_by(|a, b| a.code.cmp(&b.code));
        Eligibility { centers, members }
    }

    #[test]
    fn assigns_to_nearest_center() {
        let a = center("17001", 46.0, -1.0);
        let (lat, lng) = offset_north_km(46.0, -1.0, 20.0);
        let b = center("17002", lat, lng);
        let (lat, lng) = offset_north_km(46.0, -1.0, 6.0);
        let near_a = commune("17010", lat, lng);
        let (lat, lng) = offset_north_km(46.0, -1.0, 14.0);
        let near_b = commune("17020", lat, lng);

        let assignment = build_zones(&split(&[&a, &b], &[&near_a, &near_b]), 15.0);

        assert_eq!(assignment.zones.len(), 2);
        assert_eq!(
            assignment.zones[0].codes(),
            BTreeSet::from(["17001".to_string(), "17010".to_string()])
        );
        assert_eq!(
            assignment.zones[1].codes(),
            BTreeSet::from(["17002".to_string(), "17020".to_string()])
        );
        assert!(assignment.unassigned.is_empty());
    }

    #[test]
    fn excludes_municipalities_beyond_radius() {
        let a = center("17001", 46.0, -1.0);
        let (lat, lng) = offset_east_km(46.0, -1.0, 25.0);
        let far = commune("17099", lat, lng);

        let assignment = build_zones(&split(&[&a], &[&far]), 15.0);

        assert_eq!(assignment.zones[0].members.len(), 1);
        assert_eq!(assignment.unassigned.len(), 1);
        assert_eq!(assignment.unassigned[0].code, "17099");
    }

    #[test]
    fn center_stays_in_its_own_zone_even_when_eligible() {
        let a = center("17001", 46.0, -1.0);
        let (lat, lng) = offset_north_km(46.0, -1.0, 3.0);
        let b = center("17002", lat, lng);

        let assignment = build_zones(&split(&[&a, &b], &[&a, &b]), 15.0);

        assert_eq!(assignment.zones.len(), 2);
        for zone in &assignment.zones {
            assert_eq!(zone.members.len(), 1);
            assert_eq!(zone.members[0].record.code, zone.center.code);
        }
    }

    #[test]
    fn equidistant_member_goes_to_lowest_center_code() {
        let high = center("17900", 46.0, -1.0);
        let low = center("17050", 46.0, -1.0);
        let (lat, lng) = offset_north_km(46.0, -1.0, 2.0);
        let member = commune("17600", lat, lng);

        for centers in [[&high, &low], [&low, &high]] {
            let assignment = build_zones(&split(&centers, &[&member]), 15.0);
            let owner = assignment
                .zones
                .iter()
                .find(|z| z.members.len() == 2)
                .unwrap();
            assert_eq!(owner.center.code, "17050");
        }
    }

    #[test]
    fn input_order_does_not_change_zones() {
        let a = center("17001", 46.0, -1.0);
        let (lat, lng) = offset_east_km(46.0, -1.0, 18.0);
        let b = center("17002", lat, lng);
        let members: Vec<MunicipalityRecord> = (0..12)
            .map(|i| {
                let (lat, lng) = offset_east_km(46.0, -1.0, f64::from(i) * 1.7);
                commune(&format!("171{i:02}"), lat, lng)
            })
            .collect();
        let forward: Vec<&MunicipalityRecord> = members.iter().collect();
        let backward: Vec<&MunicipalityRecord> = members.iter().rev().collect();

        let one = build_zones(&split(&[&a, &b], &forward), 15.0);
        let two = build_zones(&split(&[&b, &a], &backward), 15.0);

        let codes = |z: &ZoneAssignment<'_>| {
            z.zones
                .iter()
                .map(ZoneMembers::codes)
                .collect::<Vec<_>>()
        };
        assert_eq!(codes(&one), codes(&two));
    }

    #[test]
    fn members_respect_radius_and_nearest_center() {
        let centers = [
            center("17001", 46.0, -1.0),
            center("17002", 46.1, -0.8),
            center("17003", 45.9, -1.2),
        ];
        let members: Vec<MunicipalityRecord> = (0..40)
            .map(|i| {
                let lat = 45.8 + f64::from(i % 8) * 0.05;
                let lng = -1.4 + f64::from(i / 8) * 0.15;
                commune(&format!("175{i:02}"), lat, lng)
            })
            .collect();
        let center_refs: Vec<&MunicipalityRecord> = centers.iter().collect();
        let member_refs: Vec<&MunicipalityRecord> = members.iter().collect();

        let assignment = build_zones(&split(&center_refs, &member_refs), 15.0);

        let mut seen = BTreeSet::new();
        for zone in &assignment.zones {
            for member in &zone.members {
                assert!(seen.insert(member.record.code.clone()), "duplicate member");
                assert!(member.distance_km <= 15.0);
                if member.record.code == zone.center.code {
                    continue;
                }
                for other in &centers {
                    assert!(distance_between(member.record, other) >= member.distance_km);
                }
            }
        }
    }
}
