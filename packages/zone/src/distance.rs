//! Great-circle distances between municipalities.
//!
//! All distances in the pipeline go through [`haversine_km`] so that
//! membership checks and reported distances agree.

use franchise_zones_commune_models::MunicipalityRecord;
use geo::{Distance as _, Haversine, Point};

/// Mean earth radius used by [`Haversine`], in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Kilometers spanned by one degree of latitude.
pub const KM_PER_DEGREE_LAT: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Haversine distance in kilometers between two `(lat, lng)` pairs.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let a = Point::new(lng1, lat1);
    let b = Point::new(lng2, lat2);
    Haversine.distance(a, b) / 1_000.0
}

/// Haversine distance in kilometers between two municipalities.
#[must_use]
pub fn distance_between(a: &MunicipalityRecord, b: &MunicipalityRecord) -> f64 {
    haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)
}
