//! Rockfall risk prediction for one or many coordinates.
//!
//! Reads a JSON object or array of objects (stdin or `--input`), each with
//! `lat`, `lon` and optional `dem_image_path`, `dem_bounds`, `slope_method`,
//! `model_path`, `weather`. Writes one result per input to stdout; logs go
//! to stderr.
mod dem;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rockfall_core::coords::DemBounds;
use rockfall_core::heightfield::DEFAULT_MAX_ELEVATION_M;
use rockfall_core::predictor::{LogisticModel, Predictor};
use rockfall_core::slope::SlopeMode;
use rockfall_core::weather::{FixedWeather, WeatherSample, WeatherSource};
use rockfall_core::{BatchEntry, PipelineConfig, PredictionRequest, PredictionResult, RiskPipeline};

use dem::DemCache;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rockfall-predict", about = "Estimate slope and classify rockfall risk for coordinates")]
struct Args {
    /// Request JSON file (object or array). Reads stdin when omitted or `-`.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Default model file for items without `model_path`.
    #[arg(short, long, default_value = "data/model.json")]
    model: PathBuf,

    /// Pipeline configuration JSON (advanced_method, window_radius, fallback_weather_seed).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Weather sample JSON used for items without their own `weather`.
    #[arg(short, long)]
    weather: Option<PathBuf>,

    /// Bounds for DEM images whose item has no `dem_bounds`:
    /// `min_lat,max_lat,min_lon,max_lon`.
    #[arg(long, value_parser = parse_bounds)]
    dem_bounds: Option<DemBounds>,

    /// Elevation in metres represented by grayscale value 255.
    #[arg(long, default_value_t = DEFAULT_MAX_ELEVATION_M)]
    max_elevation: f32,

    /// Pin the clock (RFC 3339) for season and timestamps.
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Pretty-print the output JSON.
    #[arg(long)]
    pretty: bool,

    /// Log debug detail to stderr.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Request schema ────────────────────────────────────────────────────────────

fn parse_bounds(s: &str) -> std::result::Result<DemBounds, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match parts[..] {
        [min_lat, max_lat, min_lon, max_lon] => {
            DemBounds::new(min_lat, max_lat, min_lon, max_lon).map_err(|e| e.to_string())
        }
        _ => Err(format!("expected 4 comma-separated values, got {}", parts.len())),
    }
}

/// Accepts `12.5` or `"12.5"`.
fn number_or_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        N(f64),
        S(String),
    }
    match Option::<Num>::deserialize(d)? {
        None => Ok(None),
        Some(Num::N(v)) => Ok(Some(v)),
        Some(Num::S(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
struct LocationConfig {
    #[serde(default, deserialize_with = "number_or_string")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "number_or_string")]
    lon: Option<f64>,
    dem_image_path: Option<PathBuf>,
    dem_bounds: Option<DemBounds>,
    /// Items ask for the advanced method unless they say `simple`.
    #[serde(default = "advanced")]
    slope_method: SlopeMode,
    model_path: Option<PathBuf>,
    weather: Option<WeatherSample>,
}

fn advanced() -> SlopeMode {
    SlopeMode::Advanced
}

/// An input item that could not become a request.
struct Rejected {
    index: usize,
    lat: Option<f64>,
    lon: Option<f64>,
    error: String,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))
        }
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn lenient_coord(v: &Value, key: &str) -> Option<f64> {
    match v.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Models keyed by path; a load failure is remembered as its message.
struct ModelCache(HashMap<PathBuf, Result<Arc<dyn Predictor>, String>>);

impl ModelCache {
    fn get(&mut self, path: &Path) -> Result<Arc<dyn Predictor>, String> {
        self.0
            .entry(path.to_path_buf())
            .or_insert_with(|| match LogisticModel::load(path) {
                Ok(m) => {
                    info!(path = %path.display(), "model loaded");
                    Ok(Arc::new(m) as Arc<dyn Predictor>)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "model unavailable");
                    Err(format!("Model not loaded: {e}"))
                }
            })
            .clone()
    }
}

// ── Batch assembly ────────────────────────────────────────────────────────────

/// Decode every item, run the decodable ones, and return one entry per item
/// sorted by input position.
///
/// Collaborators are loaded sequentially; each raster and model is loaded
/// once and shared read-only across requests.
fn run_batch(
    items: &[Value],
    args: &Args,
    config: PipelineConfig,
    shared_weather: Option<Arc<dyn WeatherSource>>,
    now: DateTime<Utc>,
) -> Vec<BatchEntry> {
    let mut dems = DemCache::new(args.max_elevation);
    let mut models = ModelCache(HashMap::new());
    let mut ready: Vec<(usize, PredictionRequest)> = Vec::with_capacity(items.len());
    let mut rejected: Vec<Rejected> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let cfg = match LocationConfig::deserialize(item) {
            Ok(c) => c,
            Err(e) => {
                rejected.push(Rejected {
                    index,
                    lat: lenient_coord(item, "lat"),
                    lon: lenient_coord(item, "lon"),
                    error: format!("invalid request: {e}"),
                });
                continue;
            }
        };

        let predictor = match models.get(cfg.model_path.as_deref().unwrap_or(&args.model)) {
            Ok(p) => p,
            Err(error) => {
                rejected.push(Rejected { index, lat: cfg.lat, lon: cfg.lon, error });
                continue;
            }
        };

        let bounds = match cfg.dem_bounds.map(DemBounds::validated).transpose() {
            Ok(b) => b.or(args.dem_bounds),
            Err(e) => {
                warn!(index, error = %e, "ignoring DEM bounds");
                args.dem_bounds
            }
        };

        let mut request = PredictionRequest {
            lat: cfg.lat,
            lon: cfg.lon,
            slope_mode: cfg.slope_method,
            predictor: Some(predictor),
            weather: cfg
                .weather
                .map(|w| Arc::new(FixedWeather(w)) as Arc<dyn WeatherSource>)
                .or_else(|| shared_weather.clone()),
            ..PredictionRequest::default()
        };
        if let Some(path) = &cfg.dem_image_path {
            if bounds.is_none() {
                warn!(index, path = %path.display(), "DEM without bounds, using fallback slope");
            }
            request.grid = dems.grid(path, bounds);
        }
        ready.push((index, request));
    }

    let pipeline = RiskPipeline::new(config);
    let (indices, requests): (Vec<usize>, Vec<PredictionRequest>) = ready.into_iter().unzip();

    let mut entries: Vec<BatchEntry> = pipeline
        .predict_batch(&requests, now)
        .into_iter()
        .map(|e| BatchEntry { config_index: indices[e.config_index], ..e })
        .chain(rejected.into_iter().map(|r| BatchEntry {
            config_index: r.index,
            result: PredictionResult::failure(r.lat, r.lon, r.error, now),
        }))
        .collect();
    entries.sort_by_key(|e| e.config_index);
    entries
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose > 0 { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let now = args.now.unwrap_or_else(Utc::now);
    let config: PipelineConfig = match &args.config {
        Some(p) => read_json(p)?,
        None => PipelineConfig::default(),
    };
    let shared_weather: Option<Arc<dyn WeatherSource>> = match &args.weather {
        Some(p) => Some(Arc::new(FixedWeather(read_json::<WeatherSample>(p)?))),
        None => None,
    };

    let raw = read_input(args.input.as_deref())?;
    if raw.trim().is_empty() {
        emit(&serde_json::json!({ "error": "No input received", "timestamp": now }), args.pretty)?;
        anyhow::bail!("no input received");
    }
    let input: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            emit(&serde_json::json!({ "error": format!("Invalid JSON input: {e}"), "timestamp": now }), args.pretty)?;
            return Err(e).context("invalid JSON input");
        }
    };

    let (items, is_batch) = match input {
        Value::Array(items) => (items, true),
        single => (vec![single], false),
    };

    let entries = run_batch(&items, &args, config, shared_weather, now);

    let failures = entries.iter().filter(|e| !e.result.is_success()).count();
    info!(total = entries.len(), failures, "predictions complete");

    if is_batch {
        emit(&entries, args.pretty)
    } else {
        match entries.into_iter().next() {
            Some(entry) => emit(&entry.result, args.pretty),
            None => Ok(()),
        }
    }
}

fn emit<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
