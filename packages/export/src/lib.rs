#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Export of analysis results.
//!
//! Scored zones and ranked communes are written as CSV tables with one row
//! per entry in rank order. Zones can also be written as a `GeoJSON`
//! `FeatureCollection` of their center points for map tools.

use std::io::Write;
use std::path::Path;

use franchise_zones_zone_models::{RankedCommune, ScoredZone};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output file could not be created.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Output path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A CSV row could not be written.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// The `GeoJSON` document could not be written.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Serialize)]
struct ZoneRow<'a> {
    rank: usize,
    zone_id: &'a str,
    name: &'a str,
    region: &'a str,
    department: &'a str,
    member_count: usize,
    households: u64,
    population: u64,
    potential_clients: u64,
    pct_single_family: f64,
    pct_primary_residences: f64,
    median_income: f64,
    poverty_rate: f64,
    score_housing: f64,
    score_income: f64,
    score_market_size: f64,
    score_total: f64,
    latitude: f64,
    longitude: f64,
}

impl<'a> From<&'a ScoredZone> for ZoneRow<'a> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(scored: &'a ScoredZone) -> Self {
        let zone = &scored.zone;
        Self {
            rank: scored.rank,
            zone_id: &zone.id,
            name: &zone.name,
            region: &zone.region,
            department: &zone.department,
            member_count: zone.member_count(),
            households: zone.households,
            population: zone.population,
            potential_clients: scored.potential_clients.max(0.0) as u64,
            pct_single_family: round2(zone.pct_single_family),
            pct_primary_residences: round2(zone.pct_primary_residences),
            median_income: zone.median_income.round(),
            poverty_rate: round2(zone.poverty_rate),
            score_housing: round2(scored.scores.housing),
            score_income: round2(scored.scores.income),
            score_market_size: round2(scored.scores.market_size),
            score_total: round2(scored.scores.total),
            latitude: zone.center_latitude,
            longitude: zone.center_longitude,
        }
    }
}

#[derive(Serialize)]
struct CommuneRow<'a> {
    rank: usize,
    code: &'a str,
    name: &'a str,
    region: &'a str,
    department: &'a str,
    households: u64,
    population: u64,
    potential_clients: u64,
    pct_single_family: f64,
    pct_primary_residences: f64,
    median_income: f64,
    poverty_rate: f64,
    score_housing: f64,
    score_income: f64,
    score_market_size: f64,
    score_total: f64,
    latitude: f64,
    longitude: f64,
}

impl<'a> From<&'a RankedCommune> for CommuneRow<'a> {
    fn from(ranked: &'a RankedCommune) -> Self {
        let record = &ranked.record;
        Self {
            rank: ranked.rank,
            code: &record.code,
            name: &record.name,
            region: &record.region,
            department: &record.department,
            households: record.households,
            population: record.population,
            potential_clients: ranked.potential_clients,
            pct_single_family: round2(record.pct_single_family),
            pct_primary_residences: round2(record.pct_primary_residences),
            median_income: record.median_income.round(),
            poverty_rate: round2(record.poverty_rate),
            score_housing: round2(ranked.scores.housing),
            score_income: round2(ranked.scores.income),
            score_market_size: round2(ranked.scores.market_size),
            score_total: round2(ranked.scores.total),
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}

fn write_rows<W: Write, T: Serialize>(
    writer: W,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn create(path: &Path) -> Result<std::io::BufWriter<std::fs::File>, ExportError> {
    std::fs::File::create(path)
        .map(std::io::BufWriter::new)
        .map_err(|e| ExportError::Io {
            path: path.display().to_string(),
            source: e,
        })
}

/// Writes scored zones as CSV, one row per zone.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if a row cannot be written.
pub fn write_zones_csv<W: Write>(writer: W, zones: &[ScoredZone]) -> Result<(), ExportError> {
    write_rows(writer, zones.iter().map(ZoneRow::from))
}

/// Writes scored zones as a CSV file.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_zones_csv_file(path: &Path, zones: &[ScoredZone]) -> Result<(), ExportError> {
    write_zones_csv(create(path)?, zones)?;
    log::info!("Wrote {} zones to {}", zones.len(), path.display());
    Ok(())
}

/// Writes ranked communes as CSV, one row per commune.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if a row cannot be written.
pub fn write_communes_csv<W: Write>(
    writer: W,
    communes: &[RankedCommune],
) -> Result<(), ExportError> {
    write_rows(writer, communes.iter().map(CommuneRow::from))
}

/// Writes ranked communes as a CSV file.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_communes_csv_file(path: &Path, communes: &[RankedCommune]) -> Result<(), ExportError> {
    write_communes_csv(create(path)?, communes)?;
    log::info!("Wrote {} communes to {}", communes.len(), path.display());
    Ok(())
}

/// One point feature per zone, located at the zone center.
#[must_use]
pub fn zones_feature_collection(zones: &[ScoredZone]) -> FeatureCollection {
    zones
        .iter()
        .map(|scored| {
            let zone = &scored.zone;
            let mut feature = Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    zone.center_longitude,
                    zone.center_latitude,
                ]))),
                id: Some(geojson::feature::Id::String(zone.id.clone())),
                properties: None,
                foreign_members: None,
            };
            feature.set_property("rank", scored.rank);
            feature.set_property("name", zone.name.clone());
            feature.set_property("center", zone.center_name.clone());
            feature.set_property("region", zone.region.clone());
            feature.set_property("department", zone.department.clone());
            feature.set_property("members", zone.member_count());
            feature.set_property("households", zone.households);
            feature.set_property("centroid", vec![zone.centroid_longitude, zone.centroid_latitude]);
            feature.set_property("score_housing", round2(scored.scores.housing));
            feature.set_property("score_income", round2(scored.scores.income));
            feature.set_property("score_market_size", round2(scored.scores.market_size));
            feature.set_property("score_total", round2(scored.scores.total));
            feature.set_property("potential_clients", scored.potential_clients.round());
            feature
        })
        .collect()
}

/// Writes the zone centers as a `GeoJSON` file.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_zones_geojson_file(path: &Path, zones: &[ScoredZone]) -> Result<(), ExportError> {
    let geojson = GeoJson::from(zones_feature_collection(zones));
    let mut writer = create(path)?;
    serde_json::to_writer(&mut writer, &geojson)?;
    writer.flush().map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    log::info!("Wrote {} zone features to {}", zones.len(), path.display());
    Ok(())
}
