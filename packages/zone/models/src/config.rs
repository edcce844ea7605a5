//! Analysis configuration.
//!
//! [`AnalysisConfig`] is an immutable value passed into every pipeline
//! stage. It deserializes from TOML with every field optional, falling
//! back to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ScoreWeights;

/// Smallest accepted zone radius in kilometers.
pub const MIN_ZONE_RADIUS_KM: f64 = 10.0;

/// Largest accepted zone radius in kilometers.
pub const MAX_ZONE_RADIUS_KM: f64 = 50.0;

/// Errors raised while loading or validating an [`AnalysisConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML document is malformed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of its permitted range.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Per-municipality thresholds for zone membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EligibilityCriteria {
    /// Minimum percent single-family housing.
    pub min_pct_single_family: f64,
    /// Minimum percent primary residences.
    pub min_pct_primary_residences: f64,
    /// Minimum household count.
    pub min_households: u64,
}

impl Default for EligibilityCriteria {
    fn default() -> Self {
        Self {
            min_pct_single_family: 20.0,
            min_pct_primary_residences: 50.0,
            min_households: 100,
        }
    }
}

/// Thresholds an aggregated zone must meet to be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ZoneCriteria {
    /// Minimum member municipalities.
    pub min_members: usize,
    /// Minimum household-weighted percent single-family housing.
    pub min_avg_pct_single_family: f64,
    /// Minimum household-weighted percent primary residences.
    pub min_avg_pct_primary_residences: f64,
    /// Minimum total households (0 disables the check).
    pub min_households: u64,
    /// Minimum household-weighted median income (0 disables the check).
    pub min_median_income: f64,
}

impl Default for ZoneCriteria {
    fn default() -> Self {
        Self {
            min_members: 2,
            min_avg_pct_single_family: 50.0,
            min_avg_pct_primary_residences: 70.0,
            min_households: 0,
            min_median_income: 0.0,
        }
    }
}

/// Every tunable parameter of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// Maximum great-circle distance from a member to its center.
    pub zone_radius_km: f64,
    /// Minimum population for a municipality to anchor a zone.
    pub center_min_population: u64,
    /// When nothing reaches `center_min_population`, this many of the most
    /// populous eligible municipalities become centers instead.
    pub fallback_center_count: usize,
    /// Municipality-level thresholds.
    pub eligibility: EligibilityCriteria,
    /// Zone-level thresholds.
    pub zone_criteria: ZoneCriteria,
    /// Lower household bound of the market-size log scale.
    pub market_floor_households: u64,
    /// Share of households expected to become clients.
    pub conversion_rate: f64,
    /// Reference income for the income sub-score. Computed from the record
    /// store (median of medians) when absent.
    pub national_median_income: Option<f64>,
    /// Settings of the per-commune ranking.
    pub communes: CommuneRankingConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            zone_radius_km: 15.0,
            center_min_population: 1_000,
            fallback_center_count: 100,
            eligibility: EligibilityCriteria::default(),
            zone_criteria: ZoneCriteria::default(),
            market_floor_households: 500,
            conversion_rate: 0.02,
            national_median_income: None,
            communes: CommuneRankingConfig::default(),
        }
    }
}

/// Thresholds and scale of the per-commune ranking.
///
/// Unlike zone scoring, communes are scored on fixed absolute scales so a
/// commune's score does not depend on the other candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CommuneRankingConfig {
    /// Minimum percent single-family housing.
    pub min_pct_single_family: f64,
    /// Minimum percent primary residences.
    pub min_pct_primary_residences: f64,
    /// Minimum household count.
    pub min_households: u64,
    /// Minimum median income.
    pub min_median_income: f64,
    /// Income at which the income level term saturates is 1.5x this value.
    pub reference_income: f64,
    /// Household count at which the market-size score reaches 100.
    pub market_cap_households: u64,
    /// Weights of the three sub-scores.
    pub weights: ScoreWeights,
    /// Number of communes kept.
    pub limit: usize,
}

impl Default for CommuneRankingConfig {
    fn default() -> Self {
        Self {
            min_pct_single_family: 50.0,
            min_pct_primary_residences: 70.0,
            min_households: 1_000,
            min_median_income: 24_000.0,
            reference_income: 26_000.0,
            market_cap_households: 50_000,
            weights: ScoreWeights {
                housing: 0.25,
                income: 0.50,
                size: 0.25,
            },
            limit: 50,
        }
    }
}

impl AnalysisConfig {
    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed input or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks every range constraint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid =
            |message: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid { message }) };

        if !(MIN_ZONE_RADIUS_KM..=MAX_ZONE_RADIUS_KM).contains(&self.zone_radius_km) {
            return invalid(format!(
                "zone_radius_km must be between {MIN_ZONE_RADIUS_KM} and {MAX_ZONE_RADIUS_KM}, got {}",
                self.zone_radius_km
            ));
        }

        if !(0.0..=1.0).contains(&self.conversion_rate) {
            return invalid(format!(
                "conversion_rate must be within [0, 1], got {}",
                self.conversion_rate
            ));
        }

        for (name, value) in [
            (
                "eligibility.min_pct_single_family",
                self.eligibility.min_pct_single_family,
            ),
            (
                "eligibility.min_pct_primary_residences",
                self.eligibility.min_pct_primary_residences,
            ),
            (
                "zone_criteria.min_avg_pct_single_family",
                self.zone_criteria.min_avg_pct_single_family,
            ),
            (
                "zone_criteria.min_avg_pct_primary_residences",
                self.zone_criteria.min_avg_pct_primary_residences,
            ),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return invalid(format!("{name} must be within [0, 100], got {value}"));
            }
        }

        if !self.zone_criteria.min_median_income.is_finite()
            || self.zone_criteria.min_median_income < 0.0
        {
            return invalid(format!(
                "zone_criteria.min_median_income must be non-negative, got {}",
                self.zone_criteria.min_median_income
            ));
        }

        if !(self.communes.reference_income.is_finite() && self.communes.reference_income > 0.0) {
            return invalid(format!(
                "communes.reference_income must be positive, got {}",
                self.communes.reference_income
            ));
        }

        if self.communes.market_cap_households < 2 {
            return invalid(format!(
                "communes.market_cap_households must be at least 2, got {}",
                self.communes.market_cap_households
            ));
        }

        if let Err(e) = self.communes.weights.validate() {
            return invalid(format!("communes.weights: {e}"));
        }

        if let Some(income) = self.national_median_income
            && (!income.is_finite() || income <= 0.0)
        {
            return invalid(format!(
                "national_median_income must be positive, got {income}"
            ));
        }

        Ok(())
    }
}
