//! Per-commune ranking on fixed absolute scales.
//!
//! Where zone scores are relative to the other zones of a run, commune
//! scores use constant scales:
//!
//! * housing: `0.6 * pct_sf + 0.4 * pct_rp`
//! * income: `70 * min(income / (1.5 * reference), 1) + 30 * (100 - poverty) / 100`
//! * market size: `100 * ln(households + 1) / ln(cap)`, capped at 100

use franchise_zones_commune_models::MunicipalityRecord;
use franchise_zones_zone_models::{CommuneRankingConfig, RankedCommune, ZoneScores};

use crate::ZoneError;

/// Whether a commune passes the ranking thresholds.
#[must_use]
pub fn is_candidate(record: &MunicipalityRecord, config: &CommuneRankingConfig) -> bool {
    record.pct_single_family >= config.min_pct_single_family
        && record.pct_primary_residences >= config.min_pct_primary_residences
        && record.households >= config.min_households
        && record.median_income >= config.min_median_income
}

/// Scores one commune.
#[must_use]
pub fn score_commune(record: &MunicipalityRecord, config: &CommuneRankingConfig) -> ZoneScores {
    let housing = 0.6f64.mul_add(record.pct_single_family, 0.4 * record.pct_primary_residences);

    let income_level = (record.median_income / (config.reference_income * 1.5)).min(1.0);
    let low_poverty = ((100.0 - record.poverty_rate) / 100.0).max(0.0);
    let income = 100.0 * 0.7f64.mul_add(income_level, 0.3 * low_poverty);

    #[allow(clippy::cast_precision_loss)]
    let market_size = {
        let households = record.households as f64;
        let cap = config.market_cap_households as f64;
        ((households + 1.0).ln() / cap.ln() * 100.0).min(100.0)
    };

    let weights = &config.weights;
    let total = weights.size.mul_add(
        market_size,
        weights.income.mul_add(income, weights.housing * housing),
    );

    ZoneScores {
        housing,
        income,
        market_size,
        total,
    }
}

/// Ranks the best communes.
///
/// Candidates are sorted by total score descending, commune code ascending
/// on ties, and cut at `config.limit`.
///
/// # Errors
///
/// Returns [`ZoneError::InvalidWeights`] if the ranking weights are unusable.
pub fn rank_communes(
    records: &[MunicipalityRecord],
    config: &CommuneRankingConfig,
    conversion_rate: f64,
) -> Result<Vec<RankedCommune>, ZoneError> {
    config.weights.validate()?;

    let mut ranked: Vec<RankedCommune> = records
        .iter()
        .filter(|r| is_candidate(r, config))
        .map(|record| {
            #[allow(
                clippy::cast_precision_loss,
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss
            )]
            let potential_clients = (record.households as f64 * conversion_rate) as u64;
            RankedCommune {
                rank: 0,
                record: record.clone(),
                scores: score_commune(record, config),
                potential_clients,
            }
        })
        .collect();

    let candidates = ranked.len();
    ranked.sort_by(|a, b| {
        b.scores
            .total
            .total_cmp(&a.scores.total)
            .then_with(|| a.record.code.cmp(&b.record.code))
    });
    ranked.truncate(config.limit);
    for (i, commune) in ranked.iter_mut().enumerate() {
        commune.rank = i + 1;
    }

    log::info!(
        "Commune ranking: {candidates} of {} communes eligible, kept {}",
        records.len(),
        ranked.len()
    );

    Ok(ranked)
}
