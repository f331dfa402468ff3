//! Predictor output → risk probability → ordinal risk tier.

use serde::{Deserialize, Serialize};

use crate::error::RockfallError;
use crate::features::FeatureRecord;
use crate::predictor::Predictor;

/// Ordinal hazard tier, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Closed-lower / open-upper thresholds at 0.2, 0.4, 0.6 and 0.8.
    ///
    /// Scores above 1 stay `Critical` and below 0 stay `Minimal`, so raw
    /// scalar predictors still land in a tier.
    pub fn from_probability(p: f64) -> Self {
        if p >= 0.8 {
            RiskLevel::Critical
        } else if p >= 0.6 {
            RiskLevel::High
        } else if p >= 0.4 {
            RiskLevel::Medium
        } else if p >= 0.2 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }
}

/// Risk probability for `record`.
///
/// Probability classifiers yield the second class score when there are at
/// least two, otherwise the first. Scalar predictors yield their raw output.
pub fn risk_probability(predictor: &dyn Predictor, record: &FeatureRecord) -> Result<f64, RockfallError> {
    let score = match predictor.predict_proba(record)? {
        Some(scores) => match scores.as_slice() {
            [] => return Err(RockfallError::EmptyPrediction),
            [only] => *only,
            [_, positive, ..] => *positive,
        },
        None => predictor.predict(record)?,
    };
    if score.is_finite() {
        Ok(score)
    } else {
        Err(RockfallError::NonFiniteScore(score))
    }
}
