//! Zone scoring.
//!
//! Each retained zone gets three sub-scores in `[0, 100]`:
//!
//! * housing: `0.6 * norm(single-family) + 0.4 * norm(primary residences)`
//! * income: `0.7 * norm(median income, 0.8 * national, 1.5 * national)
//!   + 0.3 * norm(100 - poverty rate)`
//! * market size: `norm(ln(households + 1))` on a log scale whose lower
//!   bound is the market floor
//!
//! The housing and poverty bounds are the min and max over the zones being
//! scored, so the same zone can score differently in a different run.

use franchise_zones_zone_models::{ScoreWeights, ScoredZone, Zone, ZoneScores};

use crate::ZoneError;

/// Value returned by [`normalize`] when the bounds coincide.
pub const NEUTRAL_SCORE: f64 = 50.0;

const HOUSING_SINGLE_FAMILY_SHARE: f64 = 0.6;
const HOUSING_PRIMARY_SHARE: f64 = 0.4;
const INCOME_LEVEL_SHARE: f64 = 0.7;
const INCOME_POVERTY_SHARE: f64 = 0.3;
const INCOME_LOW_FACTOR: f64 = 0.8;
const INCOME_HIGH_FACTOR: f64 = 1.5;

/// Maps `x` linearly from `[lo, hi]` onto `[0, 100]`, clamping outside.
///
/// Returns [`NEUTRAL_SCORE`] when `hi == lo`.
#[must_use]
pub fn normalize(x: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    if span.abs() < f64::EPSILON {
        return NEUTRAL_SCORE;
    }
    ((x - lo) / span).clamp(0.0, 1.0) * 100.0
}

/// Fixed inputs of a scoring pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    /// Reference income the income band is derived from.
    pub national_median_income: f64,
    /// Share of households expected to become clients.
    pub conversion_rate: f64,
    /// Lower household bound of the market-size scale.
    pub market_floor_households: u64,
}

/// Inclusive `(min, max)` of a value over the scored zones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Smallest observed value.
    pub min: f64,
    /// Largest observed value.
    pub max: f64,
}

impl Range {
    fn over(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, v| {
            Some(acc.map_or(Self { min: v, max: v }, |r: Self| Self {
                min: r.min.min(v),
                max: r.max.max(v),
            }))
        })
    }

    fn normalize(self, x: f64) -> f64 {
        normalize(x, self.min, self.max)
    }
}

/// Normalization bounds computed once per scoring pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBounds {
    /// Percent single-family housing.
    pub pct_single_family: Range,
    /// Percent primary residences.
    pub pct_primary_residences: Range,
    /// `100 - poverty rate`.
    pub inverse_poverty: Range,
    /// Income band `[0.8, 1.5] * national median`.
    pub income: Range,
    /// `ln(households + 1)` scale.
    pub log_households: Range,
}

impl ScoreBounds {
    /// Computes bounds over `zones`. Returns `None` for an empty slice.
    ///
    /// The market-size scale runs from `ln(floor)` to `ln(max households + 1)`.
    /// Zones at or below the floor score 0 and the largest zone scores 100.
    #[must_use]
    pub fn from_zones(zones: &[Zone], params: &ScoringParams) -> Option<Self> {
        let pct_single_family = Range::over(zones.iter().map(|z| z.pct_single_family))?;
        let pct_primary_residences = Range::over(zones.iter().map(|z| z.pct_primary_residences))?;
        let inverse_poverty = Range::over(zones.iter().map(|z| 100.0 - z.poverty_rate))?;
        let largest = zones.iter().map(log_households).fold(f64::MIN, f64::max);

        #[allow(clippy::cast_precision_loss)]
        let floor = (params.market_floor_households.max(1) as f64).ln();

        Some(Self {
            pct_single_family,
            pct_primary_residences,
            inverse_poverty,
            income: Range {
                min: params.national_median_income * INCOME_LOW_FACTOR,
                max: params.national_median_income * INCOME_HIGH_FACTOR,
            },
            log_households: Range {
                min: floor,
                max: largest,
            },
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn log_households(zone: &Zone) -> f64 {
    (zone.households as f64 + 1.0).ln()
}

/// Housing sub-score.
#[must_use]
pub fn housing_score(zone: &Zone, bounds: &ScoreBounds) -> f64 {
    HOUSING_SINGLE_FAMILY_SHARE * bounds.pct_single_family.normalize(zone.pct_single_family)
        + HOUSING_PRIMARY_SHARE
            * bounds
                .pct_primary_residences
                .normalize(zone.pct_primary_residences)
}

/// Income sub-score.
#[must_use]
pub fn income_score(zone: &Zone, bounds: &ScoreBounds) -> f64 {
    INCOME_LEVEL_SHARE * bounds.income.normalize(zone.median_income)
        + INCOME_POVERTY_SHARE * bounds.inverse_poverty.normalize(100.0 - zone.poverty_rate)
}

/// Market-size sub-score.
///
/// Every zone scores 0 when even the largest one is below the market floor.
#[must_use]
pub fn market_size_score(zone: &Zone, bounds: &ScoreBounds) -> f64 {
    let scale = bounds.log_households;
    if scale.max < scale.min {
        return 0.0;
    }
    scale.normalize(log_households(zone))
}

/// Expected clients for a zone.
#[must_use]
pub fn potential_clients(zone: &Zone, conversion_rate: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let households = zone.households as f64;
    households * conversion_rate
}

/// Scores one zone against precomputed bounds. Weights are assumed valid.
#[must_use]
pub fn score_zone(zone: &Zone, bounds: &ScoreBounds, weights: &ScoreWeights) -> ZoneScores {
    let housing = housing_score(zone, bounds);
    let income = income_score(zone, bounds);
    let market_size = market_size_score(zone, bounds);
    let total = (weights.size.mul_add(
        market_size,
        weights.income.mul_add(income, weights.housing * housing),
    ))
    .clamp(0.0, 100.0);

    ZoneScores {
        housing,
        income,
        market_size,
        total,
    }
}

/// Sorts by total score descending (zone id ascending on ties) and assigns
/// 1-based ranks.
pub fn rank(zones: &mut [ScoredZone]) {
    zones.sort_by(|a, b| {
        b.scores
            .total
            .total_cmp(&a.scores.total)
            .then_with(|| a.zone.id.cmp(&b.zone.id))
    });
    for (i, zone) in zones.iter_mut().enumerate() {
        zone.rank = i + 1;
    }
}

/// Scores and ranks every zone.
///
/// # Errors
///
/// Returns [`ZoneError::InvalidWeights`] before touching any zone if the
/// weights are negative or do not sum to 1.0.
pub fn score_zones(
    zones: Vec<Zone>,
    weights: &ScoreWeights,
    params: &ScoringParams,
) -> Result<Vec<ScoredZone>, ZoneError> {
    weights.validate()?;

    let Some(bounds) = ScoreBounds::from_zones(&zones, params) else {
        log::info!("Scoring: no zones to score");
        return Ok(Vec::new());
    };
    log::debug!("Scoring bounds: {bounds:?}");

    let mut scored: Vec<ScoredZone> = zones
        .into_iter()
        .map(|zone| {
            let scores = score_zone(&zone, &bounds, weights);
            let potential_clients = potential_clients(&zone, params.conversion_rate);
            ScoredZone {
                rank: 0,
                zone,
                scores,
                potential_clients,
            }
        })
        .collect();

    rank(&mut scored);

    log::info!(
        "Scoring: {} zones scored (weights {:.2}/{:.2}/{:.2})",
        scored.len(),
        weights.housing,
        weights.income,
        weights.size
    );

    Ok(scored)
}
