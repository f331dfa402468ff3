use thiserror::Error;

/// Failures that end a single prediction request.
///
/// These surface as `PredictionResult::Failure`; none of them abort a batch.
#[derive(Debug, Error)]
pub enum RockfallError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("missing required field: {0}")]
    MissingCoordinate(&'static str),

    #[error("invalid {field}: {value} is not a finite number")]
    InvalidCoordinate { field: &'static str, value: f64 },

    #[error("invalid DEM bounds: {0}")]
    InvalidBounds(String),

    #[error("elevation grid is {width}x{height} but holds {len} values")]
    GridShape { width: usize, height: usize, len: usize },

    #[error("feature mismatch: model expects {expected:?}, record provides {found:?}")]
    FeatureMismatch { expected: Vec<String>, found: Vec<String> },

    #[error("predictor returned no class scores")]
    EmptyPrediction,

    #[error("predictor returned a non-finite score ({0})")]
    NonFiniteScore(f64),

    #[error("failed to read model file: {0}")]
    ModelRead(#[from] std::io::Error),

    #[error("failed to parse model file: {0}")]
    ModelParse(#[from] serde_json::Error),

    #[error("weather provider failed: {0}")]
    Weather(String),
}

/// Numeric failures inside window math. Always recovered by the slope
/// fallback chain, never surfaced to callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlopeError {
    #[error("window {rows}x{cols} is too small for this method")]
    UndersizedWindow { rows: usize, cols: usize },

    #[error("window contains non-finite elevation")]
    NonFiniteElevation,

    #[error("slope gradient is not finite")]
    NonFiniteGradient,
}
