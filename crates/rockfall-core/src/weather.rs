//! Weather observations and the provider seam.
//!
//! A provider failure is never a request failure: the pipeline logs it and
//! substitutes a bounded-random sample from [`FallbackWeather`].

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::coords::LatLon;
use crate::error::RockfallError;

/// Point-in-time weather observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temperature_celsius: f64,
    #[serde(default)]
    pub rainfall_mm: f64,
    #[serde(alias = "humidity")]
    pub humidity_pct: f64,
    #[serde(default)]
    pub wind_speed_kmh: f64,
    #[serde(alias = "weather_condition", alias = "condition")]
    pub condition_text: String,
    #[serde(default = "default_is_day")]
    pub is_day: bool,
    #[serde(default = "default_pressure_mb")]
    pub pressure_mb: f64,
}

fn default_is_day() -> bool {
    true
}

fn default_pressure_mb() -> f64 {
    1013.0
}

/// Source of current weather at a coordinate.
pub trait WeatherSource: Send + Sync {
    fn current(&self, at: LatLon) -> Result<WeatherSample, RockfallError>;
}

/// Always returns the same observation.
#[derive(Debug, Clone)]
pub struct FixedWeather(pub WeatherSample);

impl WeatherSource for FixedWeather {
    fn current(&self, _at: LatLon) -> Result<WeatherSample, RockfallError> {
        Ok(self.0.clone())
    }
}

// ── Fallback sample ───────────────────────────────────────────────────────────

const RAINFALL_CHOICES_MM: [f64; 6] = [0.0, 0.0, 0.0, 2.0, 8.0, 15.0];

/// Bounded-random stand-in used when no provider is bound or it fails.
///
/// Ranges: temperature 20–35 °C, rainfall one of {0, 0, 0, 2, 8, 15} mm,
/// humidity 40–80 %, wind 5–20 km/h, pressure 1010–1020 mb, clear daytime sky.
///
/// With a seed, the sample is a pure function of `(seed, lat, lon)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackWeather {
    pub seed: Option<u64>,
}

impl FallbackWeather {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    pub fn sample(&self, at: LatLon) -> WeatherSample {
        let mut rng = match self.seed {
            Some(seed) => {
                StdRng::seed_from_u64(seed ^ at.lat.to_bits() ^ at.lon.to_bits().rotate_left(32))
            }
            None => StdRng::from_entropy(),
        };
        WeatherSample {
            temperature_celsius: rng.gen_range(20.0..=35.0),
            rainfall_mm: *RAINFALL_CHOICES_MM.choose(&mut rng).unwrap_or(&0.0),
            humidity_pct: rng.gen_range(40..=80) as f64,
            wind_speed_kmh: rng.gen_range(5.0..=20.0),
            condition_text: "Clear".to_string(),
            is_day: true,
            pressure_mb: rng.gen_range(1010..=1020) as f64,
        }
    }
}

/// Current weather from `source`, or the fallback sample when there is no
/// source or it fails.
pub fn current_or_fallback(
    source: Option<&dyn WeatherSource>,
    at: LatLon,
    fallback: &FallbackWeather,
) -> WeatherSample {
    match source.map(|s| s.current(at)) {
        Some(Ok(sample)) => sample,
        Some(Err(e)) => {
            warn!(lat = at.lat, lon = at.lon, error = %e, "weather provider failed, using fallback sample");
            fallback.sample(at)
        }
        None => fallback.sample(at),
    }
}

/// Weather fields echoed in a prediction result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSummary {
    pub temperature_celsius: f64,
    pub rainfall_mm: f64,
    pub humidity: f64,
    pub condition: String,
}

impl From<&WeatherSample> for WeatherSummary {
    fn from(w: &WeatherSample) -> Self {
        Self {
            temperature_celsius: round_to(w.temperature_celsius, 1),
            rainfall_mm: round_to(w.rainfall_mm, 1),
            humidity: w.humidity_pct,
            condition: w.condition_text.clone(),
        }
    }
}

pub(crate) fn round_to(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}
