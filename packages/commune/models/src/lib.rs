#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Municipality (commune) record types.
//!
//! A [`MunicipalityRecord`] is the typed, validated row produced by the
//! ingestion layer from the INSEE housing, income, and geography tables.
//! Records are immutable for the duration of an analysis run.

pub mod regions;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// One French municipality with the statistics used for zone analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityRecord {
    /// INSEE commune code (e.g. "17300"). Unique across the store.
    pub code: String,
    /// Commune name (e.g. "La Rochelle").
    pub name: String,
    /// Administrative region name.
    pub region: String,
    /// Department code (e.g. "17", "2A", "974").
    pub department: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Estimated total population.
    pub population: u64,
    /// Number of households.
    pub households: u64,
    /// Share of dwellings that are single-family houses, in percent.
    pub pct_single_family: f64,
    /// Share of dwellings that are primary residences, in percent.
    pub pct_primary_residences: f64,
    /// Median income in euros.
    pub median_income: f64,
    /// Poverty rate in percent.
    pub poverty_rate: f64,
}

/// Reasons a record fails load-time validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordIssue {
    /// The commune code is empty.
    EmptyCode,
    /// A percentage field lies outside `[0, 100]`.
    PercentOutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Latitude or longitude is not a finite value in range.
    InvalidCoordinates {
        /// Latitude as read.
        latitude: f64,
        /// Longitude as read.
        longitude: f64,
    },
    /// Median income is negative or not finite.
    InvalidIncome(f64),
}

impl std::fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCode => write!(f, "empty commune code"),
            Self::PercentOutOfRange { field, value } => {
                write!(f, "{field} = {value} is outside [0, 100]")
            }
            Self::InvalidCoordinates {
                latitude,
                longitude,
            } => write!(f, "invalid coordinates ({latitude}, {longitude})"),
            Self::InvalidIncome(value) => write!(f, "invalid median income {value}"),
        }
    }
}

impl std::error::Error for RecordIssue {}

impl MunicipalityRecord {
    /// Checks the record invariants: non-empty code, percentages in
    /// `[0, 100]`, finite in-range coordinates, non-negative income.
    ///
    /// # Errors
    ///
    /// Returns the first [`RecordIssue`] found.
    pub fn validate(&self) -> Result<(), RecordIssue> {
        if self.code.trim().is_empty() {
            return Err(RecordIssue::EmptyCode);
        }

        for (field, value) in [
            ("pct_single_family", self.pct_single_family),
            ("pct_primary_residences", self.pct_primary_residences),
            ("poverty_rate", self.poverty_rate),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(RecordIssue::PercentOutOfRange { field, value });
            }
        }

        if !self.latitude.is_finite()
            || !self.longitude.is_finite()
            || !(-90.0..=90.0).contains(&self.latitude)
            || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(RecordIssue::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }

        if !self.median_income.is_finite() || self.median_income < 0.0 {
            return Err(RecordIssue::InvalidIncome(self.median_income));
        }

        Ok(())
    }
}

/// Median of a set of values, ignoring non-finite entries.
///
/// Returns `None` for an empty input. Even-length inputs average the two
/// middle values.
#[must_use]
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}
