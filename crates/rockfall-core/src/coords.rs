//! Geographic coordinate types.
//! All coordinate math uses f64 for precision.
use serde::{Deserialize, Serialize};

use crate::error::RockfallError;

/// A point in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from optional request fields, rejecting missing or non-finite values.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Result<Self, RockfallError> {
        let lat = lat.ok_or(RockfallError::MissingCoordinate("lat"))?;
        let lon = lon.ok_or(RockfallError::MissingCoordinate("lon"))?;
        if !lat.is_finite() {
            return Err(RockfallError::InvalidCoordinate { field: "lat", value: lat });
        }
        if !lon.is_finite() {
            return Err(RockfallError::InvalidCoordinate { field: "lon", value: lon });
        }
        Ok(Self { lat, lon })
    }
}

/// Geographic bounding box of a DEM raster.
///
/// Row 0 of the raster is `max_lat` (north), column 0 is `min_lon` (west).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl DemBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self, RockfallError> {
        Self { min_lat, max_lat, min_lon, max_lon }.validated()
    }

    /// Check `max > min` on both axes. Deserialized bounds must pass through here.
    pub fn validated(self) -> Result<Self, RockfallError> {
        let all_finite = [self.min_lat, self.max_lat, self.min_lon, self.max_lon]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(RockfallError::InvalidBounds("bounds must be finite".into()));
        }
        if self.max_lat <= self.min_lat {
            return Err(RockfallError::InvalidBounds(format!(
                "max_lat {} must exceed min_lat {}",
                self.max_lat, self.min_lat
            )));
        }
        if self.max_lon <= self.min_lon {
            return Err(RockfallError::InvalidBounds(format!(
                "max_lon {} must exceed min_lon {}",
                self.max_lon, self.min_lon
            )));
        }
        Ok(self)
    }

    /// Fractional position of `ll` inside the box: `(x_ratio, y_ratio)`.
    /// The latitude axis is inverted so that `y_ratio = 0` is the northern edge.
    /// Values outside `[0, 1]` mean the point lies outside the box.
    pub fn ratios(&self, ll: LatLon) -> (f64, f64) {
        let x_ratio = (ll.lon - self.min_lon) / (self.max_lon - self.min_lon);
        let y_ratio = (self.max_lat - ll.lat) / (self.max_lat - self.min_lat);
        (x_ratio, y_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(DemBounds::new(38.0, 37.0, 119.0, 120.0).is_err());
        assert!(DemBounds::new(37.0, 38.0, 120.0, 120.0).is_err());
        assert!(DemBounds::new(37.0, f64::NAN, 119.0, 120.0).is_err());
        assert!(DemBounds::new(37.63, 38.16, 119.17, 119.90).is_ok());
    }

    #[test]
    fn ratios_put_north_west_at_origin() {
        let b = DemBounds::new(10.0, 20.0, 30.0, 40.0).unwrap();
        assert_eq!(b.ratios(LatLon::new(20.0, 30.0)), (0.0, 0.0));
        assert_eq!(b.ratios(LatLon::new(10.0, 40.0)), (1.0, 1.0));
        assert_eq!(b.ratios(LatLon::new(15.0, 35.0)), (0.5, 0.5));
    }

    #[test]
    fn missing_or_nan_coordinates_fail() {
        assert!(matches!(
            LatLon::from_parts(None, Some(1.0)),
            Err(RockfallError::MissingCoordinate("lat"))
        ));
        assert!(matches!(
            LatLon::from_parts(Some(1.0), None),
            Err(RockfallError::MissingCoordinate("lon"))
        ));
        assert!(matches!(
            LatLon::from_parts(Some(f64::NAN), Some(1.0)),
            Err(RockfallError::InvalidCoordinate { field: "lat", .. })
        ));
        assert_eq!(LatLon::from_parts(Some(1.0), Some(2.0)).unwrap(), LatLon::new(1.0, 2.0));
    }
}
