//! End-to-end analysis run.
//!
//! Validation happens before any zone is built: weights, configuration
//! and code uniqueness. The run itself is a pure function of the records
//! and parameters, so repeating it yields identical output.

use std::collections::BTreeSet;

use franchise_zones_commune_models::{MunicipalityRecord, median};
use franchise_zones_zone_models::{AnalysisConfig, ScoreWeights, ScoredZone, ZoneSummary};
use serde::Serialize;

use crate::ZoneError;
use crate::aggregate::aggregate_zones;
use crate::builder::build_zones;
use crate::eligibility::classify;
use crate::filter::retain_zones;
use crate::scoring::{ScoringParams, score_zones};
use crate::select::summarize;

/// Reference income used when the store carries no usable income at all.
pub const FALLBACK_NATIONAL_MEDIAN_INCOME: f64 = 22_000.0;

/// Counts collected along the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    /// Records in the store.
    pub records: usize,
    /// Records meeting the member thresholds.
    pub eligible_members: usize,
    /// Zone centers.
    pub centers: usize,
    /// Non-center members assigned to a zone.
    pub assigned: usize,
    /// Eligible non-center members with no center in range.
    pub unassigned: usize,
    /// Zones built, one per center.
    pub zones_built: usize,
    /// Zones that passed the zone filter and were scored.
    pub zones_scored: usize,
}

/// Output of [`run_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Scored zones ordered by rank.
    pub zones: Vec<ScoredZone>,
    /// Stage counts.
    pub stats: PipelineStats,
    /// Reference income the income band was built from.
    pub national_median_income: f64,
}

impl AnalysisResult {
    /// The `n` best-ranked zones.
    #[must_use]
    pub fn top(&self, n: usize) -> &[ScoredZone] {
        &self.zones[..n.min(self.zones.len())]
    }

    /// Looks a zone up by id (its center code).
    #[must_use]
    pub fn zone_details(&self, id: &str) -> Option<&ScoredZone> {
        self.zones.iter().find(|z| z.zone.id == id)
    }

    /// Whether no zone survived the filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Summary figures over all scored zones.
    #[must_use]
    pub fn summary(&self) -> ZoneSummary {
        summarize(&self.zones)
    }
}

/// Reference income: the configured override, else the median of record
/// median incomes, else [`FALLBACK_NATIONAL_MEDIAN_INCOME`].
#[must_use]
pub fn national_median_income(records: &[MunicipalityRecord], config: &AnalysisConfig) -> f64 {
    if let Some(income) = config.national_median_income {
        return income;
    }

    match median(records.iter().map(|r| r.median_income)) {
        Some(income) if income > 0.0 => income,
        _ => {
            log::warn!(
                "No usable median income in {} records; using {FALLBACK_NATIONAL_MEDIAN_INCOME}",
                records.len()
            );
            FALLBACK_NATIONAL_MEDIAN_INCOME
        }
    }
}

fn validate_records(records: &[MunicipalityRecord]) -> Result<(), ZoneError> {
    let mut seen = BTreeSet::new();
    for record in records {
        record.validate().map_err(|issue| ZoneError::InvalidRecord {
            code: record.code.clone(),
            issue,
        })?;
        if !seen.insert(record.code.as_str()) {
            return Err(ZoneError::DuplicateCode {
                code: record.code.clone(),
            });
        }
    }
    Ok(())
}

/// Runs eligibility, zone building, aggregation, filtering and scoring.
///
/// An empty result is not an error.
///
/// # Errors
///
/// * [`ZoneError::InvalidWeights`] if the weights are unusable
/// * [`ZoneError::InvalidConfig`] if a parameter is out of range
/// * [`ZoneError::InvalidRecord`] if a record has out-of-range fields
/// * [`ZoneError::DuplicateCode`] if two records share a code
pub fn run_analysis(
    records: &[MunicipalityRecord],
    config: &AnalysisConfig,
    weights: &ScoreWeights,
) -> Result<AnalysisResult, ZoneError> {
    weights.validate()?;
    config.validate()?;
    validate_records(records)?;

    let national_median_income = national_median_income(records, config);

    let eligibility = classify(records, config);
    let assignment = build_zones(&eligibility, config.zone_radius_km);
    let zones = aggregate_zones(&assignment.zones);
    let zones_built = zones.len();
    let retained = retain_zones(zones, &config.zone_criteria);

    let params = ScoringParams {
        national_median_income,
        conversion_rate: config.conversion_rate,
        market_floor_households: config.market_floor_households,
    };
    let scored = score_zones(retained, weights, &params)?;

    let stats = PipelineStats {
        records: records.len(),
        eligible_members: eligibility.members.len(),
        centers: eligibility.centers.len(),
        assigned: assignment.assigned_count(),
        unassigned: assignment.unassigned.len(),
        zones_built,
        zones_scored: scored.len(),
    };

    if scored.is_empty() {
        log::warn!("Analysis produced no zones; thresholds may be too strict");
    } else {
        log::info!(
            "Analysis complete: {} zones scored from {} records (national median income {national_median_income:.0})",
            stats.zones_scored,
            stats.records
        );
    }

    Ok(AnalysisResult {
        zones: scored,
        stats,
        national_median_income,
    })
}

#[cfg(test)]
mod tests {
    use franchise_zones_commune_models::RecordIssue;

    use super::*;
    use crate::test_support::{center, commune, offset_east_km};

    fn store() -> Vec<MunicipalityRecord> {
        let a = center("17001", 46.0, -1.0);
        let mut members = Vec::new();
        for (i, km) in [3.0, 6.0, 9.0].into_iter().enumerate() {
            let (lat, lng) = offset_east_km(46.0, -1.0, km);
            members.push(commune(&format!("1701{i}"), lat, lng));
        }
        let (lat, lng) = offset_east_km(46.0, -1.0, 40.0);
        let b = center("17002", lat, lng);
        let (lat, lng) = offset_east_km(46.0, -1.0, 44.0);
        members.push(commune("17020", lat, lng));

        let mut records = vec![a, b];
        records.extend(members);
        records
    }

    #[test]
    fn counts_every_stage() {
        let result =
            run_analysis(&store(), &AnalysisConfig::default(), &ScoreWeights::default()).unwrap();

        assert_eq!(result.stats.records, 6);
        assert_eq!(result.stats.centers, 2);
        assert_eq!(result.stats.assigned, 4);
        assert_eq!(result.stats.unassigned, 0);
        assert_eq!(result.stats.zones_built, 2);
        assert_eq!(result.stats.zones_scored, 2);
        assert_eq!(result.zones[0].rank, 1);
        assert_eq!(result.zones[1].rank, 2);
    }

    #[test]
    fn invalid_weights_fail_before_work() {
        let weights = ScoreWeights {
            housing: 0.5,
            income: 0.5,
            size: 0.5,
        };
        assert!(matches!(
            run_analysis(&store(), &AnalysisConfig::default(), &weights),
            Err(ZoneError::InvalidWeights(_))
        ));
    }

    #[test]
    fn invalid_radius_is_rejected() {
        let config = AnalysisConfig {
            zone_radius_km: 3.0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            run_analysis(&store(), &config, &ScoreWeights::default()),
            Err(ZoneError::InvalidConfig(_))
        ));
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let mut records = store();
        records.push(commune("17010", 46.5, -1.0));
        let err = run_analysis(&records, &AnalysisConfig::default(), &ScoreWeights::default())
            .unwrap_err();
        assert!(matches!(err, ZoneError::DuplicateCode { code } if code == "17010"));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let mut records = store();
        records.push(commune("17030", f64::NAN, -1.0));
        let err = run_analysis(&records, &AnalysisConfig::default(), &ScoreWeights::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ZoneError::InvalidRecord {
                code,
                issue: RecordIssue::InvalidCoordinates { .. },
            } if code == "17030"
        ));
    }

    #[test]
    fn national_income_prefers_override() {
        let records = store();
        assert!((national_median_income(&records, &AnalysisConfig::default()) - 22_000.0).abs() < 1e-9);

        let config = AnalysisConfig {
            national_median_income: Some(26_000.0),
            ..AnalysisConfig::default()
        };
        assert!((national_median_income(&records, &config) - 26_000.0).abs() < 1e-9);
        assert!(
            (national_median_income(&[], &AnalysisConfig::default())
                - FALLBACK_NATIONAL_MEDIAN_INCOME)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn accessors() {
        let result =
            run_analysis(&store(), &AnalysisConfig::default(), &ScoreWeights::default()).unwrap();

        assert_eq!(result.top(1).len(), 1);
        assert_eq!(result.top(10).len(), 2);
        assert!(result.zone_details("17002").is_some());
        assert!(result.zone_details("99999").is_none());
        assert_eq!(result.summary().zone_count, 2);
    }
}
