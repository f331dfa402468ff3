//! Fixed-schema feature record consumed by the predictor.
//!
//! Column names and their order are a contract with the trained model.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::climate::{Season, Trigger};

/// Column names in the order the predictor expects them.
pub const FEATURE_COLUMNS: [&str; 9] = [
    "Type of slope movement",
    "Season",
    "min_volume",
    "median_volume",
    "max_volume",
    "Relative size",
    "Rock unit",
    "slope_angle_degrees",
    "trigger",
];

/// Rockfall movement type code.
pub const SLOPE_MOVEMENT_TYPE: &str = "RF";
pub const MIN_VOLUME: f64 = 5.0;
pub const MEDIAN_VOLUME: f64 = 20.0;
pub const MAX_VOLUME: f64 = 50.0;
pub const RELATIVE_SIZE: &str = "small";
pub const ROCK_UNIT: &str = "Khd";

/// One cell of a feature row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl FeatureValue<'_> {
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            FeatureValue::Number(v) => Some(v),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match *self {
            FeatureValue::Text(s) => Some(s),
            FeatureValue::Number(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub slope_movement_type: &'static str,
    pub season: Season,
    pub min_volume: f64,
    pub median_volume: f64,
    pub max_volume: f64,
    pub relative_size: &'static str,
    pub rock_unit: &'static str,
    pub slope_angle_degrees: f64,
    pub trigger: Trigger,
}

impl FeatureRecord {
    /// Record with the fixed rockfall constants and the computed fields.
    pub fn new(slope_angle_degrees: f64, season: Season, trigger: Trigger) -> Self {
        Self {
            slope_movement_type: SLOPE_MOVEMENT_TYPE,
            season,
            min_volume: MIN_VOLUME,
            median_volume: MEDIAN_VOLUME,
            max_volume: MAX_VOLUME,
            relative_size: RELATIVE_SIZE,
            rock_unit: ROCK_UNIT,
            slope_angle_degrees,
            trigger,
        }
    }

    /// Values aligned with [`FEATURE_COLUMNS`].
    pub fn values(&self) -> [FeatureValue<'static>; 9] {
        [
            FeatureValue::Text(self.slope_movement_type),
            FeatureValue::Text(self.season.as_str()),
            FeatureValue::Number(self.min_volume),
            FeatureValue::Number(self.median_volume),
            FeatureValue::Number(self.max_volume),
            FeatureValue::Text(self.relative_size),
            FeatureValue::Text(self.rock_unit),
            FeatureValue::Number(self.slope_angle_degrees),
            FeatureValue::Text(self.trigger.as_str()),
        ]
    }

    /// `(column, value)` pairs in contract order.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, FeatureValue<'static>)> {
        FEATURE_COLUMNS.into_iter().zip(self.values())
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COLUMNS.len()))?;
        for (name, value) in self.columns() {
            match value {
                FeatureValue::Text(s) => map.serialize_entry(name, s)?,
                FeatureValue::Number(v) => map.serialize_entry(name, &v)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_and_computed_fields_land_in_order() {
        let rec = FeatureRecord::new(41.5, Season::Monsoon, Trigger::Precipitation);
        let values = rec.values();
        assert_eq!(values[0], FeatureValue::Text("RF"));
        assert_eq!(values[1], FeatureValue::Text("Monsoon"));
        assert_eq!(values[2].as_number(), Some(5.0));
        assert_eq!(values[3].as_number(), Some(20.0));
        assert_eq!(values[4].as_number(), Some(50.0));
        assert_eq!(values[5].as_text(), Some("small"));
        assert_eq!(values[6].as_text(), Some("Khd"));
        assert_eq!(values[7].as_number(), Some(41.5));
        assert_eq!(values[8].as_text(), Some("Precipitation"));
    }

    #[test]
    fn json_keeps_column_order() {
        let rec = FeatureRecord::new(20.0, Season::Fall, Trigger::LightThermal);
        let json = serde_json::to_string(&rec).unwrap();
        let positions: Vec<usize> = FEATURE_COLUMNS
            .iter()
            .map(|c| json.find(&format!("\"{c}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]), "{json}");
        assert!(json.contains("\"trigger\":\"Light/Thermal\""));
    }
}
