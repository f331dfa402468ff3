use serde::Serialize;

use crate::coords::{DemBounds, LatLon};
use crate::error::{RockfallError, SlopeError};

/// Default top of the grayscale elevation ramp: value 255 maps to this height.
pub const DEFAULT_MAX_ELEVATION_M: f32 = 3000.0;

/// A 2D elevation grid in metres, row-major, row 0 = north.
/// Coordinate math uses f64; elevation values use f32.
///
/// The grid is read-only once built and may be shared across requests.
/// Only constructible through [`ElevationGrid::new`], which checks the shape.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    /// Row-major elevation values in metres.
    data: Vec<f32>,
    width: usize,
    height: usize,
    /// Geographic extent. A grid without bounds cannot map coordinates.
    bounds: Option<DemBounds>,
}

/// Integer raster index, always inside `[0, height-1] × [0, width-1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelCoordinate {
    pub row: usize,
    pub col: usize,
}

impl ElevationGrid {
    pub fn new(data: Vec<f32>, width: usize, height: usize, bounds: Option<DemBounds>) -> Result<Self, RockfallError> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(RockfallError::GridShape { width, height, len: data.len() });
        }
        let bounds = bounds.map(DemBounds::validated).transpose()?;
        Ok(Self { data, width, height, bounds })
    }

    /// Build from 8-bit grayscale pixels: `v / 255 × max_elevation_m`.
    pub fn from_grayscale(
        pixels: &[u8],
        width: usize,
        height: usize,
        max_elevation_m: f32,
        bounds: Option<DemBounds>,
    ) -> Result<Self, RockfallError> {
        let data = pixels
            .iter()
            .map(|&v| v as f32 / 255.0 * max_elevation_m)
            .collect();
        Self::new(data, width, height, bounds)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Option<&DemBounds> {
        self.bounds.as_ref()
    }

    /// Map a coordinate to its pixel by linear interpolation over the bounds.
    ///
    /// Returns `None` only when the grid has no bounds. Coordinates outside
    /// the bounds clamp to the nearest edge pixel instead of failing.
    pub fn to_pixel(&self, ll: LatLon) -> Option<PixelCoordinate> {
        let bounds = self.bounds.as_ref()?;
        let (x_ratio, y_ratio) = bounds.ratios(ll);

        // `as i64` truncates toward zero and saturates on overflow.
        let col = (x_ratio * self.width as f64) as i64;
        let row = (y_ratio * self.height as f64) as i64;

        Some(PixelCoordinate {
            row: row.clamp(0, self.height as i64 - 1) as usize,
            col: col.clamp(0, self.width as i64 - 1) as usize,
        })
    }

    /// Extract the `(2·radius+1)²` window centred on `pixel`.
    ///
    /// Rows and columns falling outside the grid are replaced by the nearest
    /// edge row/column (edge replication, no wraparound), so the window is
    /// always full-size and its centre is always `pixel`.
    ///
    /// `radius` is capped at the larger grid dimension.
    pub fn extract_window(&self, pixel: PixelCoordinate, radius: usize) -> ElevationWindow {
        let radius = radius.min(self.width.max(self.height));
        let size = 2 * radius + 1;
        let mut data = Vec::with_capacity(size * size);
        for dr in 0..size {
            let r = (pixel.row + dr).saturating_sub(radius).min(self.height - 1);
            for dc in 0..size {
                let c = (pixel.col + dc).saturating_sub(radius).min(self.width - 1);
                data.push(self.get(r, c) as f64);
            }
        }
        ElevationWindow { data, rows: size, cols: size }
    }

    pub fn min_elevation(&self) -> f32 {
        self.data.iter().cloned().fold(f32::INFINITY, f32::min)
    }

    pub fn max_elevation(&self) -> f32 {
        self.data.iter().cloned().fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Small row-major neighbourhood of elevations (metres) around a target cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationWindow {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl ElevationWindow {
    /// Build from explicit rows. All rows must share the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Option<Self> {
        let cols = rows.first()?.as_ref().len();
        if cols == 0 || rows.iter().any(|r| r.as_ref().len() != cols) {
            return None;
        }
        let data = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        Some(Self { data, rows: rows.len(), cols })
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Centre index, `(rows / 2, cols / 2)`.
    pub fn center(&self) -> (usize, usize) {
        (self.rows / 2, self.cols / 2)
    }

    pub fn ensure_finite(&self) -> Result<(), SlopeError> {
        if self.data.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(SlopeError::NonFiniteElevation)
        }
    }

    /// The 3×3 block around the centre, row-major `a..i`.
    pub fn center_3x3(&self) -> Result<[f64; 9], SlopeError> {
        if self.rows < 3 || self.cols < 3 {
            return Err(SlopeError::UndersizedWindow { rows: self.rows, cols: self.cols });
        }
        let (cr, cc) = self.center();
        let mut out = [0.0; 9];
        for dr in 0..3 {
            for dc in 0..3 {
                out[dr * 3 + dc] = self.get(cr + dr - 1, cc + dc - 1);
            }
        }
        Ok(out)
    }
}
