#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone, score and configuration types for franchise zone analysis.
//!
//! A [`Zone`] is a disjoint cluster of municipalities anchored on one
//! center municipality. Zones that survive the zone-level criteria are
//! scored into [`ScoredZone`]s using a [`ScoreWeights`] triple.

pub mod config;
pub mod weights;

use std::collections::BTreeSet;

use franchise_zones_commune_models::MunicipalityRecord;
use serde::{Deserialize, Serialize};

pub use config::{
    AnalysisConfig, CommuneRankingConfig, ConfigError, EligibilityCriteria, ZoneCriteria,
};
pub use weights::{ScoreWeights, WeightPreset, WeightsError};

/// A cluster of municipalities around one center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Zone identifier, equal to the center municipality code.
    pub id: String,
    /// Display name built from member names (e.g. "Aytré, Lagord, Périgny + 2 autres").
    pub name: String,
    /// Center municipality code.
    pub center_code: String,
    /// Center municipality name.
    pub center_name: String,
    /// Center latitude.
    pub center_latitude: f64,
    /// Center longitude.
    pub center_longitude: f64,
    /// Mean latitude of all members.
    pub centroid_latitude: f64,
    /// Mean longitude of all members.
    pub centroid_longitude: f64,
    /// Member municipality codes, including the center.
    pub members: BTreeSet<String>,
    /// Sum of member households.
    pub households: u64,
    /// Sum of member populations.
    pub population: u64,
    /// Household-weighted percent single-family housing.
    pub pct_single_family: f64,
    /// Household-weighted percent primary residences.
    pub pct_primary_residences: f64,
    /// Household-weighted median income.
    pub median_income: f64,
    /// Household-weighted poverty rate.
    pub poverty_rate: f64,
    /// Region of the center municipality.
    pub region: String,
    /// Department of the center municipality.
    pub department: String,
}

impl Zone {
    /// Number of member municipalities.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// The three normalized sub-scores and their weighted total, all in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneScores {
    /// Housing fit.
    pub housing: f64,
    /// Income level.
    pub income: f64,
    /// Market size.
    pub market_size: f64,
    /// Weighted total.
    pub total: f64,
}

/// A retained zone with its scores attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredZone {
    /// 1-based position by descending total score.
    pub rank: usize,
    /// The aggregated zone.
    pub zone: Zone,
    /// Sub-scores and total.
    pub scores: ZoneScores,
    /// Estimated client count (households x conversion rate).
    pub potential_clients: f64,
}

/// Aggregate figures over a set of scored zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    /// Number of zones.
    pub zone_count: usize,
    /// Mean total score (0 when there are no zones).
    pub mean_score: f64,
    /// Total households across zones.
    pub total_households: u64,
    /// Total potential clients across zones.
    pub total_potential_clients: f64,
    /// Number of distinct regions represented.
    pub region_count: usize,
    /// Regions ordered by zone count, descending.
    pub top_regions: Vec<RegionCount>,
}

/// Number of zones in a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCount {
    /// Region name.
    pub region: String,
    /// Zone count.
    pub count: usize,
}

/// A single municipality scored on the fixed absolute scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCommune {
    /// 1-based position by descending total score.
    pub rank: usize,
    /// The municipality.
    pub record: MunicipalityRecord,
    /// Sub-scores and total.
    pub scores: ZoneScores,
    /// Whole expected clients (households x conversion rate, truncated).
    pub potential_clients: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_scores_serialize_camel_case() {
        let scores = ZoneScores {
            housing: 60.0,
            income: 40.0,
            market_size: 50.0,
            total: 51.0,
        };
        let value = serde_json::to_value(scores).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "housing": 60.0,
                "income": 40.0,
                "marketSize": 50.0,
                "total": 51.0,
            })
        );
    }

    #[test]
    fn weights_round_trip_through_json() {
        let weights = WeightPreset::Marche.weights();
        let json = serde_json::to_string(&weights).unwrap();
        let back: ScoreWeights = serde_json::from_str(&json).unwrap();
        assert_eq!(back, weights);
    }
}
