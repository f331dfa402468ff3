//! Slope angle estimation at a single point.
//!
//! Three finite-difference schemes share the signature `window → degrees`:
//!   - `Gradient`    central/one-sided differences at the window centre
//!   - `Horn`        weighted 3×3 (Horn 1981)
//!   - `Zevenbergen` orthogonal neighbours only (Zevenbergen & Thorne 1987)
//!
//! [`estimate_slope`] chains them: advanced method → gradient → coordinate
//! fallback. Numeric failures step down one level and are never surfaced.
mod gradient;
pub mod fallback;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coords::LatLon;
use crate::error::SlopeError;
use crate::heightfield::{ElevationGrid, ElevationWindow};

pub use fallback::fallback_slope;

/// A window-based slope algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlopeMethod {
    #[serde(alias = "simple")]
    Gradient,
    Horn,
    Zevenbergen,
}

impl SlopeMethod {
    /// Slope in degrees, in `[0, 90]`.
    pub fn compute(self, window: &ElevationWindow) -> Result<f64, SlopeError> {
        window.ensure_finite()?;
        let (dz_dx, dz_dy) = match self {
            SlopeMethod::Gradient => gradient::center_gradient(window)?,
            SlopeMethod::Horn => gradient::horn_gradient(&window.center_3x3()?),
            SlopeMethod::Zevenbergen => gradient::zevenbergen_gradient(&window.center_3x3()?),
        };
        gradient::slope_degrees(dz_dx, dz_dy)
    }
}

/// Which level of the estimator chain a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlopeMode {
    /// The configured advanced method (Horn unless overridden).
    Advanced,
    /// Centre-cell gradient.
    #[default]
    Simple,
}

/// Estimator that actually produced a slope value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeSource {
    Gradient,
    Horn,
    Zevenbergen,
    FallbackEstimation,
}

impl From<SlopeMethod> for SlopeSource {
    fn from(m: SlopeMethod) -> Self {
        match m {
            SlopeMethod::Gradient => SlopeSource::Gradient,
            SlopeMethod::Horn => SlopeSource::Horn,
            SlopeMethod::Zevenbergen => SlopeSource::Zevenbergen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlopeEstimate {
    pub degrees: f64,
    pub source: SlopeSource,
}

impl SlopeEstimate {
    fn fallback(ll: LatLon) -> Self {
        Self { degrees: fallback_slope(ll), source: SlopeSource::FallbackEstimation }
    }
}

/// Estimate the slope at `ll`.
///
/// Without a grid, or with a grid that has no bounds, the coordinate fallback
/// is used directly. Otherwise the `(2·radius+1)²` window around the pixel is
/// fed to the requested method; any numeric failure steps down to the
/// gradient method and then to the fallback.
pub fn estimate_slope(
    grid: Option<&ElevationGrid>,
    ll: LatLon,
    mode: SlopeMode,
    advanced_method: SlopeMethod,
    window_radius: usize,
) -> SlopeEstimate {
    let Some(grid) = grid else {
        debug!(lat = ll.lat, lon = ll.lon, "no elevation grid, using fallback slope");
        return SlopeEstimate::fallback(ll);
    };
    let Some(pixel) = grid.to_pixel(ll) else {
        debug!(lat = ll.lat, lon = ll.lon, "elevation grid has no bounds, using fallback slope");
        return SlopeEstimate::fallback(ll);
    };
    let window = grid.extract_window(pixel, window_radius);

    let first = match mode {
        SlopeMode::Advanced => advanced_method,
        SlopeMode::Simple => SlopeMethod::Gradient,
    };
    let chain = [Some(first), (first != SlopeMethod::Gradient).then_some(SlopeMethod::Gradient)];

    for method in chain.into_iter().flatten() {
        match method.compute(&window) {
            Ok(degrees) => {
                debug!(?method, row = pixel.row, col = pixel.col, degrees, "slope from elevation window");
                return SlopeEstimate { degrees, source: method.into() };
            }
            Err(e) => warn!(?method, error = %e, "slope method failed, stepping down"),
        }
    }
    SlopeEstimate::fallback(ll)
}
