//! Deterministic slope estimate for when no raster data is usable.

use crate::coords::LatLon;

/// Reference point the pseudo-variation is measured from.
pub const REFERENCE: LatLon = LatLon { lat: 23.79, lon: 86.44 };

const BASE_SLOPE_DEG: f64 = 35.0;
const VARIATION_SCALE: f64 = 1000.0;
const VARIATION_PERIOD: f64 = 30.0;
const MIN_SLOPE_DEG: f64 = 15.0;
const MAX_SLOPE_DEG: f64 = 75.0;

/// Reproducible slope in `[15, 75]` degrees as a function of coordinates only.
///
/// `variation  = (|lat − 23.79| + |lon − 86.44|) × 1000`
/// `adjustment = (variation mod 30) − 15`
/// `slope      = clamp(35 + adjustment, 15, 75)`
pub fn fallback_slope(ll: LatLon) -> f64 {
    let variation = ((ll.lat - REFERENCE.lat).abs() + (ll.lon - REFERENCE.lon).abs()) * VARIATION_SCALE;
    // `rem_euclid` keeps the adjustment in [-15, 15) even for huge inputs.
    let adjustment = variation.rem_euclid(VARIATION_PERIOD) - VARIATION_PERIOD / 2.0;
    let slope = BASE_SLOPE_DEG + adjustment;
    if slope.is_finite() {
        slope.clamp(MIN_SLOPE_DEG, MAX_SLOPE_DEG)
    } else {
        BASE_SLOPE_DEG
    }
}
