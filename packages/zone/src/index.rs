//! R-tree over zone centers for radius-bounded nearest-center lookups.
//!
//! Centers are indexed by `[lng, lat]`. A query first collects the centers
//! inside a degree bounding box that is guaranteed to contain the search
//! circle, then measures each candidate with [`haversine_km`]. The box only
//! prunes; membership is always decided by the haversine distance.

use franchise_zones_commune_models::MunicipalityRecord;
use rstar::{AABB, RTree, RTreeObject};

use crate::distance::{KM_PER_DEGREE_LAT, haversine_km};

/// Padding applied to the degree bounding box.
const ENVELOPE_MARGIN: f64 = 1.05;

/// A center stored in the R-tree.
struct CenterEntry<'a> {
    record: &'a MunicipalityRecord,
    position: [f64; 2],
}

impl RTreeObject for CenterEntry<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// The nearest center found for a municipality.
#[derive(Debug, Clone, Copy)]
pub struct NearestCenter<'a> {
    /// The center record.
    pub center: &'a MunicipalityRecord,
    /// Haversine distance in kilometers.
    pub distance_km: f64,
}

/// Spatial index over zone centers.
pub struct CenterIndex<'a> {
    tree: RTree<CenterEntry<'a>>,
}

impl<'a> CenterIndex<'a> {
    /// Bulk-loads the given centers.
    #[must_use]
    pub fn new(centers: &[&'a MunicipalityRecord]) -> Self {
        let entries = centers
            .iter()
            .map(|&record| CenterEntry {
                record,
                position: [record.longitude, record.latitude],
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed centers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no centers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Returns the nearest center within `radius_km` of `(lat, lng)`.
    ///
    /// Equidistant centers are resolved in favor of the lowest commune
    /// code, so the result does not depend on insertion order.
    #[must_use]
    pub fn nearest_within(&self, lat: f64, lng: f64, radius_km: f64) -> Option<NearestCenter<'a>> {
        let mut best: Option<NearestCenter<'a>> = None;

        for entry in self.candidates(lat, lng, radius_km) {
            let distance_km = haversine_km(
                lat,
                lng,
                entry.record.latitude,
                entry.record.longitude,
            );
            if distance_km > radius_km {
                continue;
            }

            let closer = best.is_none_or(|current| {
                distance_km
                    .total_cmp(&current.distance_km)
                    .then_with(|| entry.record.code.cmp(&current.center.code))
                    .is_lt()
            });

            if closer {
                best = Some(NearestCenter {
                    center: entry.record,
                    distance_km,
                });
            }
        }

        best
    }

    fn candidates(&self, lat: f64, lng: f64, radius_km: f64) -> Vec<&CenterEntry<'a>> {
        let lat_pad = radius_km / KM_PER_DEGREE_LAT * ENVELOPE_MARGIN;
        let widest_lat = (lat.abs() + lat_pad).min(90.0);
        let cos = widest_lat.to_radians().cos();

        // Near the poles or across the antimeridian the box is not a
        // simple rectangle; scan everything instead.
        if cos < 1e-3 {
            return self.tree.iter().collect();
        }
        let lng_pad = lat_pad / cos;
        if lng - lng_pad < -180.0 || lng + lng_pad > 180.0 {
            return self.tree.iter().collect();
        }

        let envelope =
            AABB::from_corners([lng - lng_pad, lat - lat_pad], [lng + lng_pad, lat + lat_pad]);
        self.tree.locate_in_envelope(&envelope).collect()
    }
}
