#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Franchise zone construction and scoring.
//!
//! Runs the analysis pipeline over an in-memory municipality store:
//!
//! 1. [`eligibility`]: select zone centers and eligible members
//! 2. [`builder`]: assign each member to its nearest center within the radius
//! 3. [`aggregate`]: reduce members to household-weighted zone statistics
//! 4. [`filter`]: drop zones failing the zone-level criteria
//! 5. [`scoring`]: normalize, weight and rank the retained zones
//!
//! [`pipeline::run_analysis`] chains all five. [`select`] and [`communes`]
//! work on the results for the dashboard and exports.

pub mod aggregate;
pub mod builder;
pub mod communes;
pub mod distance;
pub mod eligibility;
pub mod filter;
pub mod index;
pub mod pipeline;
pub mod scoring;
pub mod select;

use franchise_zones_commune_models::RecordIssue;
use franchise_zones_zone_models::{ConfigError, WeightsError};

pub use pipeline::{AnalysisResult, PipelineStats, run_analysis};

/// Errors that stop an analysis run before any zone is built.
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    /// The score weights are negative or do not sum to 1.0.
    #[error("Invalid score weights: {0}")]
    InvalidWeights(#[from] WeightsError),

    /// An analysis parameter is out of range.
    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A record breaks a field invariant, such as non-finite coordinates.
    #[error("Invalid record {code}: {issue}")]
    InvalidRecord {
        /// Code of the offending record.
        code: String,
        /// What is wrong with it.
        #[source]
        issue: RecordIssue,
    },

    /// Two records share a commune code.
    #[error("Duplicate commune code {code}")]
    DuplicateCode {
        /// The repeated code.
        code: String,
    },
}

#[cfg(test)]
pub(crate) mod test_support {
    use franchise_zones_commune_models::{MunicipalityRecord, regions};

    use crate::distance::KM_PER_DEGREE_LAT;

    /// An eligible, non-center municipality.
    pub fn commune(code: &str, lat: f64, lng: f64) -> MunicipalityRecord {
        let department = regions::department_from_code(code)
            .unwrap_or_default()
            .to_string();
        MunicipalityRecord {
            code: code.to_string(),
            name: format!("Commune {code}"),
            region: regions::region_for_department(&department).to_string(),
            department,
            latitude: lat,
            longitude: lng,
            population: 500,
            households: 500,
            pct_single_family: 70.0,
            pct_primary_residences: 85.0,
            median_income: 22_000.0,
            poverty_rate: 12.0,
        }
    }

    /// A municipality populous enough to anchor a zone.
    pub fn center(code: &str, lat: f64, lng: f64) -> MunicipalityRecord {
        MunicipalityRecord {
            population: 5_000,
            households: 2_000,
            ..commune(code, lat, lng)
        }
    }

    pub fn offset_north_km(lat: f64, lng: f64, km: f64) -> (f64, f64) {
        (lat + km / KM_PER_DEGREE_LAT, lng)
    }

    pub fn offset_east_km(lat: f64, lng: f64, km: f64) -> (f64, f64) {
        (lat, lng + km / (KM_PER_DEGREE_LAT * lat.to_radians().cos()))
    }
}
