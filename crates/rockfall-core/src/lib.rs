//! Rockfall hazard estimation core.
//!
//! Pipeline:
//!   coordinates → [`heightfield`] pixel lookup and window →
//!   [`slope`] estimator → [`climate`] season + trigger →
//!   [`features`] record → [`predictor`] → [`risk`] tier.
//!
//! Raster decoding, weather fetching and JSON framing live in the
//! `rockfall-predict` tool; this crate does no I/O beyond reading model files.

pub mod climate;
pub mod coords;
pub mod error;
pub mod features;
pub mod heightfield;
pub mod pipeline;
pub mod predictor;
pub mod risk;
pub mod slope;
pub mod weather;

pub use error::{RockfallError, SlopeError};
pub use pipeline::{BatchEntry, PipelineConfig, PredictionRequest, PredictionResult, RiskPipeline};
