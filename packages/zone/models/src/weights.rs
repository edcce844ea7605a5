//! Scoring weights and named presets.
//!
//! A [`ScoreWeights`] triple must be non-negative and sum to 1.0 within
//! [`WEIGHT_SUM_TOLERANCE`]. Invalid weights are reported, never
//! renormalized.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Allowed absolute deviation of the weight sum from 1.0 (0.1%).
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

/// Errors raised when a weight triple is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightsError {
    /// A component is negative or not finite.
    #[error("{component} weight must be a non-negative number, got {value}")]
    Negative {
        /// Which component (`housing`, `income`, `size`).
        component: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Components do not sum to 1.0.
    #[error(
        "weights must sum to 1.0 (housing {housing} + income {income} + size {size} = {sum})"
    )]
    BadSum {
        /// Housing weight.
        housing: f64,
        /// Income weight.
        income: f64,
        /// Market-size weight.
        size: f64,
        /// Their sum.
        sum: f64,
    },
}

/// Fractions applied to the housing, income and market-size sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    /// Weight of the housing sub-score.
    pub housing: f64,
    /// Weight of the income sub-score.
    pub income: f64,
    /// Weight of the market-size sub-score.
    pub size: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        WeightPreset::Classique.weights()
    }
}

impl ScoreWeights {
    /// Builds and validates a weight triple.
    ///
    /// # Errors
    ///
    /// Returns [`WeightsError`] if any weight is negative or the sum is
    /// not 1.0.
    pub fn new(housing: f64, income: f64, size: f64) -> Result<Self, WeightsError> {
        let weights = Self {
            housing,
            income,
            size,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Builds weights from whole percentages (e.g. `40, 30, 30`).
    ///
    /// # Errors
    ///
    /// Returns [`WeightsError::BadSum`] unless the percentages total 100.
    pub fn from_percentages(housing: u32, income: u32, size: u32) -> Result<Self, WeightsError> {
        Self::new(
            f64::from(housing) / 100.0,
            f64::from(income) / 100.0,
            f64::from(size) / 100.0,
        )
    }

    /// Parses `"h,i,s"`. Values above 1 are read as percentages.
    ///
    /// # Errors
    ///
    /// Returns a message if the string is malformed, or the validation
    /// error if the triple is invalid.
    pub fn parse_triple(s: &str) -> Result<Self, String> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid weights '{s}': {e}"))?;

        let &[h, i, z] = parts.as_slice() else {
            return Err(format!(
                "expected three comma-separated weights, got {}",
                parts.len()
            ));
        };

        let scale = if h + i + z > 1.0 + WEIGHT_SUM_TOLERANCE * 10.0 {
            100.0
        } else {
            1.0
        };

        Self::new(h / scale, i / scale, z / scale).map_err(|e| e.to_string())
    }

    /// Sum of the three components.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.housing + self.income + self.size
    }

    /// Checks non-negativity and the unit sum.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), WeightsError> {
        for (component, value) in [
            ("housing", self.housing),
            ("income", self.income),
            ("size", self.size),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(WeightsError::Negative { component, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightsError::BadSum {
                housing: self.housing,
                income: self.income,
                size: self.size,
                sum,
            });
        }

        Ok(())
    }
}

/// Named weight presets offered by the dashboard.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum WeightPreset {
    /// 40 / 30 / 30
    #[strum(serialize = "classique", to_string = "Classique (40/30/30)")]
    Classique,
    /// 33 / 33 / 34
    #[strum(
        serialize = "equilibre",
        serialize = "équilibré",
        to_string = "Équilibré (33/33/34)"
    )]
    Equilibre,
    /// 60 / 20 / 20
    #[strum(serialize = "focus-logement", to_string = "Focus Logement (60/20/20)")]
    FocusLogement,
    /// 20 / 60 / 20
    #[strum(serialize = "focus-revenus", to_string = "Focus Revenus (20/60/20)")]
    FocusRevenus,
    /// 20 / 20 / 60
    #[strum(serialize = "focus-taille", to_string = "Focus Taille (20/20/60)")]
    FocusTaille,
    /// 20 / 30 / 50
    #[strum(
        serialize = "marche",
        serialize = "marché",
        to_string = "Marché (20/30/50)"
    )]
    Marche,
}

impl WeightPreset {
    /// Percentages `(housing, income, size)` of this preset.
    #[must_use]
    pub const fn percentages(self) -> (u32, u32, u32) {
        match self {
            Self::Classique => (40, 30, 30),
            Self::Equilibre => (33, 33, 34),
            Self::FocusLogement => (60, 20, 20),
            Self::FocusRevenus => (20, 60, 20),
            Self::FocusTaille => (20, 20, 60),
            Self::Marche => (20, 30, 50),
        }
    }

    /// Weight fractions of this preset.
    #[must_use]
    pub fn weights(self) -> ScoreWeights {
        let (housing, income, size) = self.percentages();
        ScoreWeights {
            housing: f64::from(housing) / 100.0,
            income: f64::from(income) / 100.0,
            size: f64::from(size) / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use strum::IntoEnumIterator as _;

    use super::*;

    #[test]
    fn rejects_weights_summing_to_point_nine() {
        let err = ScoreWeights::new(0.4, 0.3, 0.2).unwrap_err();
        assert!(matches!(err, WeightsError::BadSum { sum, .. } if (sum - 0.9).abs() < 1e-9));
    }

    #[test]
    fn accepts_weights_summing_to_one() {
        assert!(ScoreWeights::new(0.4, 0.3, 0.3).is_ok());
    }

    #[test]
    fn accepts_sum_within_tolerance() {
        assert!(ScoreWeights::new(0.3333, 0.3333, 0.3333).is_ok());
        assert!(ScoreWeights::new(0.33, 0.33, 0.33).is_err());
    }

    #[test]
    fn rejects_negative_weight() {
        let err = ScoreWeights::new(1.2, -0.2, 0.0).unwrap_err();
        assert_eq!(
            err,
            WeightsError::Negative {
                component: "income",
                value: -0.2
            }
        );
    }

    #[test]
    fn every_preset_is_valid() {
        for preset in WeightPreset::iter() {
            assert!(
                preset.weights().validate().is_ok(),
                "preset {preset} does not sum to 1"
            );
        }
    }

    #[test]
    fn parses_preset_names() {
        assert_eq!(
            WeightPreset::from_str("equilibre").unwrap(),
            WeightPreset::Equilibre
        );
        assert_eq!(
            WeightPreset::from_str("Focus-Taille").unwrap(),
            WeightPreset::FocusTaille
        );
        assert!(WeightPreset::from_str("nope").is_err());
    }

    #[test]
    fn parses_weight_triples() {
        let w = ScoreWeights::parse_triple("40,30,30").unwrap();
        assert!((w.housing - 0.4).abs() < 1e-12);
        let w = ScoreWeights::parse_triple("0.2, 0.3, 0.5").unwrap();
        assert!((w.size - 0.5).abs() < 1e-12);
        assert!(ScoreWeights::parse_triple("40,30").is_err());
        assert!(ScoreWeights::parse_triple("40,30,20").is_err());
    }

    #[test]
    fn default_is_classique() {
        assert_eq!(ScoreWeights::default(), WeightPreset::Classique.weights());
    }
}
