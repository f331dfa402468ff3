//! Predictor seam and a serialisable logistic model.
//!
//! The pipeline only sees [`Predictor`]; any classifier can sit behind it.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RockfallError;
use crate::features::{FeatureRecord, FeatureValue, FEATURE_COLUMNS};

/// An opaque trained model consuming a [`FeatureRecord`].
pub trait Predictor: Send + Sync {
    /// Class scores for the record, if the model is a probability classifier.
    /// `Ok(None)` means the model only supports [`Predictor::predict`].
    fn predict_proba(&self, _record: &FeatureRecord) -> Result<Option<Vec<f64>>, RockfallError> {
        Ok(None)
    }

    /// Scalar prediction for the record.
    fn predict(&self, record: &FeatureRecord) -> Result<f64, RockfallError>;
}

// ── Logistic model ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Exposes `[1 − p, p]` class probabilities.
    #[default]
    Classifier,
    /// Exposes the raw linear score only.
    Regressor,
}

/// Linear model over one-hot encoded categoricals and raw numerics.
///
/// `score = intercept + Σ numeric_weights[col] · x[col] + Σ categorical_weights[col][value]`
///
/// Categories absent from `categorical_weights` contribute zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Column names the model was fitted on, in order.
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub kind: ModelKind,
    pub intercept: f64,
    #[serde(default)]
    pub numeric_weights: HashMap<String, f64>,
    #[serde(default)]
    pub categorical_weights: HashMap<String, HashMap<String, f64>>,
}

impl LogisticModel {
    pub fn from_json(json: &str) -> Result<Self, RockfallError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RockfallError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn check_schema(&self) -> Result<(), RockfallError> {
        if self.feature_names.iter().map(String::as_str).eq(FEATURE_COLUMNS) {
            Ok(())
        } else {
            Err(RockfallError::FeatureMismatch {
                expected: self.feature_names.clone(),
                found: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            })
        }
    }

    /// Linear score for a schema-checked record.
    fn linear_score(&self, record: &FeatureRecord) -> Result<f64, RockfallError> {
        self.check_schema()?;
        let mut score = self.intercept;
        for (name, value) in record.columns() {
            score += match value {
                FeatureValue::Number(x) => self.numeric_weights.get(name).map_or(0.0, |w| w * x),
                FeatureValue::Text(cat) => self
                    .categorical_weights
                    .get(name)
                    .and_then(|by_cat| by_cat.get(cat))
                    .copied()
                    .unwrap_or(0.0),
            };
        }
        Ok(score)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Predictor for LogisticModel {
    fn predict_proba(&self, record: &FeatureRecord) -> Result<Option<Vec<f64>>, RockfallError> {
        match self.kind {
            ModelKind::Classifier => {
                let p = sigmoid(self.linear_score(record)?);
                Ok(Some(vec![1.0 - p, p]))
            }
            ModelKind::Regressor => Ok(None),
        }
    }

    fn predict(&self, record: &FeatureRecord) -> Result<f64, RockfallError> {
        let score = self.linear_score(record)?;
        Ok(match self.kind {
            ModelKind::Classifier => {
                if sigmoid(score) >= 0.5 { 1.0 } else { 0.0 }
            }
            ModelKind::Regressor => score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::{Season, Trigger};
    use approx::assert_abs_diff_eq;

    fn model_json(kind: &str, names: &[&str]) -> String {
        serde_json::json!({
            "feature_names": names,
            "kind": kind,
            "intercept": -2.0,
            "numeric_weights": { "slope_angle_degrees": 0.05 },
            "categorical_weights": {
                "Season": { "Monsoon": 1.0 },
                "trigger": { "Precipitation": 0.5 }
            }
        })
        .to_string()
    }

    #[test]
    fn classifier_scores_one_hot_and_numeric_terms() {
        let m = LogisticModel::from_json(&model_json("classifier", &FEATURE_COLUMNS)).unwrap();
        let rec = FeatureRecord::new(40.0, Season::Monsoon, Trigger::Precipitation);
        // z = −2 + 0.05·40 + 1.0 + 0.5 = 1.5
        let probs = m.predict_proba(&rec).unwrap().unwrap();
        assert_eq!(probs.len(), 2);
        assert_abs_diff_eq!(probs[1], sigmoid(1.5), epsilon = 1e-12);
        assert_abs_diff_eq!(probs[0] + probs[1], 1.0, epsilon = 1e-12);
        assert_eq!(m.predict(&rec).unwrap(), 1.0);
    }

    #[test]
    fn unknown_category_contributes_nothing() {
        let m = LogisticModel::from_json(&model_json("classifier", &FEATURE_COLUMNS)).unwrap();
        let rec = FeatureRecord::new(0.0, Season::Winter, Trigger::Spontaneous);
        let probs = m.predict_proba(&rec).unwrap().unwrap();
        assert_abs_diff_eq!(probs[1], sigmoid(-2.0), epsilon = 1e-12);
    }

    #[test]
    fn regressor_has_no_probabilities() {
        let m = LogisticModel::from_json(&model_json("regressor", &FEATURE_COLUMNS)).unwrap();
        let rec = FeatureRecord::new(40.0, Season::Fall, Trigger::Spontaneous);
        assert!(m.predict_proba(&rec).unwrap().is_none());
        assert_abs_diff_eq!(m.predict(&rec).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn reordered_schema_is_a_feature_mismatch() {
        let mut names = FEATURE_COLUMNS.to_vec();
        names.swap(0, 1);
        let m = LogisticModel::from_json(&model_json("classifier", &names)).unwrap();
        let rec = FeatureRecord::new(40.0, Season::Fall, Trigger::Spontaneous);
        assert!(matches!(m.predict_proba(&rec), Err(RockfallError::FeatureMismatch { .. })));
        assert!(matches!(m.predict(&rec), Err(RockfallError::FeatureMismatch { .. })));
    }

    #[test]
    fn malformed_model_file_is_a_parse_error() {
        assert!(matches!(LogisticModel::from_json("{\"intercept\": 1"), Err(RockfallError::ModelParse(_))));
        assert!(matches!(
            LogisticModel::load("/nonexistent/rockfall/model.json"),
            Err(RockfallError::ModelRead(_))
        ));
    }
}
