//! Request orchestrator: slope → weather → season/trigger → features → risk.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::climate::{classify_trigger, Season, Trigger};
use crate::coords::LatLon;
use crate::error::RockfallError;
use crate::features::FeatureRecord;
use crate::heightfield::ElevationGrid;
use crate::predictor::Predictor;
use crate::risk::{risk_probability, RiskLevel};
use crate::slope::{estimate_slope, SlopeMethod, SlopeMode, SlopeSource};
use crate::weather::{current_or_fallback, round_to, FallbackWeather, WeatherSource, WeatherSummary};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Settings shared by every request a pipeline serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Method used when a request asks for `advanced` slope. Default Horn.
    pub advanced_method: SlopeMethod,
    /// Neighbourhood half-width in pixels. Default 1 (3×3 window).
    pub window_radius: usize,
    /// Seed for the fallback weather sample. `None` draws from entropy.
    pub fallback_weather_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            advanced_method: SlopeMethod::Horn,
            window_radius: 1,
            fallback_weather_seed: None,
        }
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// One coordinate to assess, with its optional collaborators.
///
/// Grids, predictors and weather sources are shared read-only via `Arc`, so
/// one loaded raster or model can serve many requests.
#[derive(Clone, Default)]
pub struct PredictionRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub grid: Option<Arc<ElevationGrid>>,
    pub slope_mode: SlopeMode,
    pub predictor: Option<Arc<dyn Predictor>>,
    pub weather: Option<Arc<dyn WeatherSource>>,
}

impl PredictionRequest {
    pub fn at(lat: f64, lon: f64) -> Self {
        Self { lat: Some(lat), lon: Some(lon), ..Self::default() }
    }

    pub fn with_grid(mut self, grid: Arc<ElevationGrid>) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn with_slope_mode(mut self, mode: SlopeMode) -> Self {
        self.slope_mode = mode;
        self
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn Predictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherSource>) -> Self {
        self.weather = Some(weather);
        self
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Successful assessment of one coordinate.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub coordinates: LatLon,
    /// Rounded to 2 decimals.
    pub slope_angle_degrees: f64,
    pub slope_calculation_method: SlopeSource,
    pub season: Season,
    pub trigger: Trigger,
    pub weather: WeatherSummary,
    pub features_used: FeatureRecord,
    /// Rounded to 4 decimals.
    pub risk_probability: f64,
    pub risk_level: RiskLevel,
    pub prediction_timestamp: DateTime<Utc>,
}

/// Coordinates as supplied, possibly incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RequestCoordinates {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionFailure {
    pub error: String,
    pub coordinates: RequestCoordinates,
    pub timestamp: DateTime<Utc>,
}

impl PredictionFailure {
    pub fn new(lat: Option<f64>, lon: Option<f64>, error: impl ToString, timestamp: DateTime<Utc>) -> Self {
        Self {
            error: error.to_string(),
            coordinates: RequestCoordinates { lat, lon },
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PredictionResult {
    Success(Box<RiskAssessment>),
    Failure(PredictionFailure),
}

impl PredictionResult {
    pub fn failure(lat: Option<f64>, lon: Option<f64>, error: impl ToString, timestamp: DateTime<Utc>) -> Self {
        PredictionResult::Failure(PredictionFailure::new(lat, lon, error, timestamp))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictionResult::Success(_))
    }

    pub fn assessment(&self) -> Option<&RiskAssessment> {
        match self {
            PredictionResult::Success(a) => Some(a),
            PredictionResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PredictionResult::Success(_) => None,
            PredictionResult::Failure(f) => Some(&f.error),
        }
    }
}

/// A batch result tagged with the position of its input.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub config_index: usize,
    #[serde(flatten)]
    pub result: PredictionResult,
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Stateless between requests; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct RiskPipeline {
    config: PipelineConfig,
    fallback_weather: FallbackWeather,
}

impl RiskPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let fallback_weather = FallbackWeather::new(config.fallback_weather_seed);
        Self { config, fallback_weather }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Assess one request. Errors become a `Failure` carrying the request's
    /// coordinates and `now`.
    pub fn predict(&self, request: &PredictionRequest, now: DateTime<Utc>) -> PredictionResult {
        match self.assess(request, now) {
            Ok(a) => PredictionResult::Success(Box::new(a)),
            Err(e) => {
                debug!(lat = ?request.lat, lon = ?request.lon, error = %e, "prediction failed");
                PredictionResult::failure(request.lat, request.lon, e, now)
            }
        }
    }

    fn assess(&self, request: &PredictionRequest, now: DateTime<Utc>) -> Result<RiskAssessment, RockfallError> {
        let ll = LatLon::from_parts(request.lat, request.lon)?;

        // 1. Slope
        let slope = estimate_slope(
            request.grid.as_deref(),
            ll,
            request.slope_mode,
            self.config.advanced_method,
            self.config.window_radius,
        );

        // 2. Weather
        let weather = current_or_fallback(request.weather.as_deref(), ll, &self.fallback_weather);

        // 3. Season and trigger
        let season = Season::from_date(&now.date_naive());
        let trigger = classify_trigger(&weather, slope.degrees);

        // 4. Features
        let features = FeatureRecord::new(slope.degrees, season, trigger);

        // 5. Predictor
        let predictor = request.predictor.as_deref().ok_or(RockfallError::ModelNotLoaded)?;
        let probability = risk_probability(predictor, &features)?;

        Ok(RiskAssessment {
            coordinates: ll,
            slope_angle_degrees: round_to(slope.degrees, 2),
            slope_calculation_method: slope.source,
            season,
            trigger,
            weather: WeatherSummary::from(&weather),
            features_used: features,
            risk_probability: round_to(probability, 4),
            risk_level: RiskLevel::from_probability(probability),
            prediction_timestamp: now,
        })
    }

    /// Assess every request independently. Always returns one entry per
    /// request, in input order; a failing item never affects the others.
    pub fn predict_batch(&self, requests: &[PredictionRequest], now: DateTime<Utc>) -> Vec<BatchEntry> {
        let run = |(config_index, request): (usize, &PredictionRequest)| BatchEntry {
            config_index,
            result: self.predict(request, now),
        };

        #[cfg(feature = "threading")]
        {
            use rayon::prelude::*;
            requests.par_iter().enumerate().map(run).collect()
        }
        #[cfg(not(feature = "threading"))]
        {
            requests.iter().enumerate().map(run).collect()
        }
    }
}
