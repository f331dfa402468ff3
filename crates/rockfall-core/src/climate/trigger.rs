//! Inferred rockfall trigger from current weather and slope.

use serde::{Deserialize, Serialize};

use crate::weather::WeatherSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    Precipitation,
    #[serde(rename = "Light/Thermal")]
    LightThermal,
    Spontaneous,
}

impl Trigger {
    /// Category label consumed by the predictor.
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Precipitation => "Precipitation",
            Trigger::LightThermal => "Light/Thermal",
            Trigger::Spontaneous => "Spontaneous",
        }
    }
}

const WET_CONDITION_WORDS: [&str; 3] = ["rain", "storm", "drizzle"];

/// Ordered decision list; the first matching rule wins.
///
/// 1. rainfall > 5 mm                          → Precipitation
/// 2. condition mentions rain/storm/drizzle    → Precipitation
/// 3. temperature > 35 °C and slope > 55°      → Light/Thermal
/// 4. temperature < 5 °C                       → Light/Thermal
/// 5. humidity > 85 % and temperature > 25 °C  → Precipitation
/// 6. otherwise                                → Spontaneous
pub fn classify_trigger(weather: &WeatherSample, slope_deg: f64) -> Trigger {
    let condition = weather.condition_text.to_lowercase();
    let t = weather.temperature_celsius;

    if weather.rainfall_mm > 5.0 {
        Trigger::Precipitation
    } else if WET_CONDITION_WORDS.iter().any(|w| condition.contains(w)) {
        Trigger::Precipitation
    } else if t > 35.0 && slope_deg > 55.0 {
        Trigger::LightThermal
    } else if t < 5.0 {
        Trigger::LightThermal
    } else if weather.humidity_pct > 85.0 && t > 25.0 {
        Trigger::Precipitation
    } else {
        Trigger::Spontaneous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> WeatherSample {
        WeatherSample {
            temperature_celsius: 20.0,
            rainfall_mm: 0.0,
            humidity_pct: 50.0,
            wind_speed_kmh: 10.0,
            condition_text: "Sunny".into(),
            is_day: true,
            pressure_mb: 1013.0,
        }
    }

    #[test]
    fn heavy_rain_wins_even_with_sunny_text() {
        let w = WeatherSample { rainfall_mm: 10.0, condition_text: "sunny".into(), ..calm() };
        assert_eq!(classify_trigger(&w, 30.0), Trigger::Precipitation);
    }

    #[test]
    fn condition_words_are_case_insensitive() {
        for text in ["Light RAIN shower", "Thunderstorm", "Patchy drizzle"] {
            let w = WeatherSample { condition_text: text.into(), ..calm() };
            assert_eq!(classify_trigger(&w, 30.0), Trigger::Precipitation, "{text}");
        }
    }

    #[test]
    fn rainfall_of_exactly_five_does_not_trigger() {
        let w = WeatherSample { rainfall_mm: 5.0, ..calm() };
        assert_eq!(classify_trigger(&w, 30.0), Trigger::Spontaneous);
    }

    #[test]
    fn heat_needs_a_steep_slope() {
        let hot = WeatherSample { temperature_celsius: 38.0, ..calm() };
        assert_eq!(classify_trigger(&hot, 60.0), Trigger::LightThermal);
        assert_eq!(classify_trigger(&hot, 55.0), Trigger::Spontaneous);
    }

    #[test]
    fn cold_is_thermal_regardless_of_slope() {
        let cold = WeatherSample { temperature_celsius: 2.0, ..calm() };
        assert_eq!(classify_trigger(&cold, 10.0), Trigger::LightThermal);
    }

    #[test]
    fn thermal_rule_precedes_humidity_rule() {
        let w = WeatherSample { temperature_celsius: 36.0, humidity_pct: 95.0, ..calm() };
        assert_eq!(classify_trigger(&w, 70.0), Trigger::LightThermal);
        assert_eq!(classify_trigger(&w, 40.0), Trigger::Precipitation);
    }

    #[test]
    fn humid_and_warm_is_precipitation() {
        let w = WeatherSample { temperature_celsius: 28.0, humidity_pct: 90.0, ..calm() };
        assert_eq!(classify_trigger(&w, 30.0), Trigger::Precipitation);
        let cool = WeatherSample { temperature_celsius: 25.0, ..w };
        assert_eq!(classify_trigger(&cool, 30.0), Trigger::Spontaneous);
    }

    #[test]
    fn label_uses_slash_form() {
        assert_eq!(serde_json::to_string(&Trigger::LightThermal).unwrap(), "\"Light/Thermal\"");
        assert_eq!(Trigger::LightThermal.as_str(), "Light/Thermal");
    }
}
