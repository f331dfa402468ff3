//! Finite-difference gradient schemes shared by the slope estimators.
//! `pub(crate)` only, not re-exported from slope/mod.rs.
//!
//! Cell size is fixed at 1 unit, so gradients are elevation change per cell.

use crate::error::SlopeError;
use crate::heightfield::ElevationWindow;

/// Horn (1981) weighted 3×3 gradient.
///
/// Returns `(dz_dx, dz_dy)`.
///
/// 3×3 neighbourhood layout (row-major `a..i`, row 0 = north):
/// ```text
///   a  b  c
///   d  e  f
///   g  h  i
/// ```
///
/// `dz/dx = ((c + 2f + i) − (a + 2d + g)) / 8`
/// `dz/dy = ((g + 2h + i) − (a + 2b + c)) / 8`
pub(crate) fn horn_gradient(w: &[f64; 9]) -> (f64, f64) {
    let [a, b, c, d, _e, f, g, h, i] = *w;
    let dz_dx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / 8.0;
    let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / 8.0;
    (dz_dx, dz_dy)
}

/// Zevenbergen & Thorne (1987) gradient from the four orthogonal neighbours.
///
/// `dz/dx = (E − W) / 2`, `dz/dy = (S − N) / 2`
pub(crate) fn zevenbergen_gradient(w: &[f64; 9]) -> (f64, f64) {
    let north = w[1];
    let west = w[3];
    let east = w[5];
    let south = w[7];
    ((east - west) / 2.0, (south - north) / 2.0)
}

/// Gradient of the window at its centre cell, computed along each axis with
/// central differences in the interior and one-sided differences at the edges.
///
/// Works for any window of at least 2×2; for a 3×3 window this reduces to the
/// orthogonal-neighbour scheme.
pub(crate) fn center_gradient(w: &ElevationWindow) -> Result<(f64, f64), SlopeError> {
    let (rows, cols) = (w.rows(), w.cols());
    if rows < 2 || cols < 2 {
        return Err(SlopeError::UndersizedWindow { rows, cols });
    }
    let (cr, cc) = w.center();
    let dz_dx = axis_difference(cols, cc, |c| w.get(cr, c));
    let dz_dy = axis_difference(rows, cr, |r| w.get(r, cc));
    Ok((dz_dx, dz_dy))
}

/// First difference at index `k` of a length-`n` sequence (`n ≥ 2`).
fn axis_difference(n: usize, k: usize, at: impl Fn(usize) -> f64) -> f64 {
    if k == 0 {
        at(1) - at(0)
    } else if k == n - 1 {
        at(n - 1) - at(n - 2)
    } else {
        (at(k + 1) - at(k - 1)) / 2.0
    }
}

/// `atan(√(dx² + dy²))` in degrees, clamped to `[0, 90]`.
pub(crate) fn slope_degrees(dz_dx: f64, dz_dy: f64) -> Result<f64, SlopeError> {
    let magnitude = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();
    if !magnitude.is_finite() {
        return Err(SlopeError::NonFiniteGradient);
    }
    Ok(magnitude.atan().to_degrees().abs().clamp(0.0, 90.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn horn_picks_up_east_rise() {
        // z = column index.
        let w = [0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
        let (dx, dy) = horn_gradient(&w);
        assert_abs_diff_eq!(dx, 1.0);
        assert_abs_diff_eq!(dy, 0.0);
    }

    #[test]
    fn zevenbergen_ignores_diagonals() {
        let w = [100.0, 0.0, -100.0, 0.0, 7.0, 4.0, 55.0, 6.0, 9.0];
        let (dx, dy) = zevenbergen_gradient(&w);
        assert_abs_diff_eq!(dx, 2.0);
        assert_abs_diff_eq!(dy, 3.0);
    }

    #[test]
    fn center_gradient_uses_one_sided_differences_on_two_wide_axes() {
        // 2 rows × 3 cols: centre = (1, 1), last row, so dy is one-sided.
        let w = ElevationWindow::from_rows(&[[0.0, 0.0, 0.0], [4.0, 5.0, 8.0]]).unwrap();
        let (dx, dy) = center_gradient(&w).unwrap();
        assert_abs_diff_eq!(dx, 2.0);
        assert_abs_diff_eq!(dy, 5.0);
    }

    #[test]
    fn center_gradient_needs_two_cells_per_axis() {
        let w = ElevationWindow::from_rows(&[[1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(
            center_gradient(&w),
            Err(SlopeError::UndersizedWindow { rows: 1, cols: 3 })
        );
    }

    #[test]
    fn unit_gradient_is_forty_five_degrees() {
        assert_abs_diff_eq!(slope_degrees(1.0, 0.0).unwrap(), 45.0, epsilon = 1e-12);
        assert_abs_diff_eq!(slope_degrees(0.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn infinite_gradient_is_an_error() {
        assert_eq!(slope_degrees(f64::INFINITY, 0.0), Err(SlopeError::NonFiniteGradient));
        assert_eq!(slope_degrees(f64::NAN, 1.0), Err(SlopeError::NonFiniteGradient));
    }
}
