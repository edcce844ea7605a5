//! Commune geography from a `GeoJSON` `FeatureCollection`.
//!
//! Each feature carries `code` and `nom` properties and a polygon or
//! multipolygon boundary. The boundary is reduced to its centroid.

use std::path::Path;

use bitcode::{Decode, Encode};
use franchise_zones_commune_models::regions::department_from_code;
use geo::Centroid as _;
use geojson::{Feature, GeoJson};

use crate::IngestError;

/// Location and identity of one commune.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct CommuneGeo {
    /// INSEE commune code.
    pub code: String,
    /// Commune name.
    pub name: String,
    /// Department code derived from the commune code.
    pub department: String,
    /// Centroid latitude.
    pub latitude: f64,
    /// Centroid longitude.
    pub longitude: f64,
}

fn property(feature: &Feature, key: &str) -> Option<String> {
    let value = feature.property(key)?;
    value
        .as_str()
        .map(|s| s.trim().to_string())
        .or_else(|| value.as_u64().map(|n| format!("{n:05}")))
        .filter(|s| !s.is_empty())
}

fn commune_from_feature(feature: Feature) -> Option<CommuneGeo> {
    let code = property(&feature, "code")?;
    let name = property(&feature, "nom").unwrap_or_else(|| code.clone());
    let department = department_from_code(&code)?.to_string();

    let geometry: geo::Geometry<f64> = feature.geometry?.try_into().ok()?;
    let centroid = geometry.centroid()?;

    Some(CommuneGeo {
        code,
        name,
        department,
        latitude: centroid.y(),
        longitude: centroid.x(),
    })
}

/// Parses a commune `FeatureCollection`.
///
/// Features without a code or a usable geometry are skipped.
///
/// # Errors
///
/// Returns [`IngestError::GeoJson`] if the text is not `GeoJSON`, or
/// [`IngestError::InvalidRecord`] if it is not a `FeatureCollection`.
pub fn parse_communes(contents: &str) -> Result<Vec<CommuneGeo>, IngestError> {
    let GeoJson::FeatureCollection(collection) = contents.parse::<GeoJson>()? else {
        return Err(IngestError::InvalidRecord {
            code: String::new(),
            message: "expected a GeoJSON FeatureCollection".to_string(),
        });
    };

    let total = collection.features.len();
    let communes: Vec<CommuneGeo> = collection
        .features
        .into_iter()
        .filter_map(commune_from_feature)
        .collect();

    if communes.len() < total {
        log::warn!(
            "Skipped {} of {total} commune features without code or geometry",
            total - communes.len()
        );
    }
    log::info!("Parsed {} commune centroids", communes.len());

    Ok(communes)
}

/// Reads and parses the commune `GeoJSON` at `path`.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read, otherwise see
/// [`parse_communes`].
pub fn parse_communes_file(path: &Path) -> Result<Vec<CommuneGeo>, IngestError> {
    log::info!("Reading commune geography {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_communes(&contents)
}
