//! Calendar season from month.
//!
//! Month → season mapping follows the South-Asian monsoon calendar:
//!   Dec–Feb Winter, Mar–May Summer, Jun–Sep Monsoon, Oct–Nov Fall.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Summer,
    Monsoon,
    Fall,
}

impl Season {
    /// Season for a 1-based calendar month. Anything outside 1–11 that is
    /// not a winter month lands in `Fall`.
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Summer,
            6..=9 => Season::Monsoon,
            _ => Season::Fall,
        }
    }

    pub fn from_date<D: Datelike>(date: &D) -> Self {
        Self::from_month(date.month())
    }

    /// Category label consumed by the predictor.
    pub fn as_str(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Summer => "Summer",
            Season::Monsoon => "Monsoon",
            Season::Fall => "Fall",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn every_month_maps_to_expected_season() {
        let expected = [
            Season::Winter,
            Season::Winter,
            Season::Summer,
            Season::Summer,
            Season::Summer,
            Season::Monsoon,
            Season::Monsoon,
            Season::Monsoon,
            Season::Monsoon,
            Season::Fall,
            Season::Fall,
            Season::Winter,
        ];
        for (i, &s) in expected.iter().enumerate() {
            assert_eq!(Season::from_month(i as u32 + 1), s, "month {}", i + 1);
        }
    }

    #[test]
    fn july_is_monsoon_november_is_fall() {
        assert_eq!(Season::from_month(7), Season::Monsoon);
        assert_eq!(Season::from_month(11), Season::Fall);
    }

    #[test]
    fn from_date_reads_month_only() {
        let d = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(Season::from_date(&d), Season::Winter);
        let d = NaiveDate::from_ymd_opt(1999, 3, 1).unwrap();
        assert_eq!(Season::from_date(&d), Season::Summer);
    }

    #[test]
    fn labels_serialize_as_category_names() {
        assert_eq!(serde_json::to_string(&Season::Monsoon).unwrap(), "\"Monsoon\"");
        assert_eq!(Season::Fall.as_str(), "Fall");
    }
}
