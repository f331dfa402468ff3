//! DEM image decoding and per-run caching.
//!
//! Images are 8-bit grayscale (colour images are converted), value `v` maps
//! to `v / 255 × max_elevation_m`. Any decoding problem is a raster error:
//! logged, and the request proceeds without a grid.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use image::GrayImage;
use tracing::{info, warn};

use rockfall_core::coords::DemBounds;
use rockfall_core::heightfield::ElevationGrid;

/// Grids keyed by image path and bounds. Each image is decoded at most once.
pub struct DemCache {
    max_elevation_m: f32,
    images: HashMap<PathBuf, Option<Arc<GrayImage>>>,
    grids: HashMap<(PathBuf, Option<[u64; 4]>), Option<Arc<ElevationGrid>>>,
}

impl DemCache {
    pub fn new(max_elevation_m: f32) -> Self {
        Self {
            max_elevation_m,
            images: HashMap::new(),
            grids: HashMap::new(),
        }
    }

    /// Grid for `path` with `bounds` attached, or `None` if the image is unusable.
    pub fn grid(&mut self, path: &Path, bounds: Option<DemBounds>) -> Option<Arc<ElevationGrid>> {
        let key = (path.to_path_buf(), bounds.map(bounds_key));
        if let Some(cached) = self.grids.get(&key) {
            return cached.clone();
        }

        let grid = self.image(path).and_then(|img| {
            let (w, h) = img.dimensions();
            match ElevationGrid::from_grayscale(img.as_raw(), w as usize, h as usize, self.max_elevation_m, bounds) {
                Ok(g) => {
                    info!(
                        path = %path.display(),
                        min_m = g.min_elevation(),
                        max_m = g.max_elevation(),
                        has_bounds = g.bounds().is_some(),
                        "elevation grid ready"
                    );
                    Some(Arc::new(g))
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unusable DEM, using fallback slope");
                    None
                }
            }
        });
        self.grids.insert(key, grid.clone());
        grid
    }

    fn image(&mut self, path: &Path) -> Option<Arc<GrayImage>> {
        self.images
            .entry(path.to_path_buf())
            .or_insert_with(|| match load_grayscale(path) {
                Ok(img) => {
                    info!(path = %path.display(), width = img.width(), height = img.height(), "DEM image loaded");
                    Some(Arc::new(img))
                }
                Err(e) => {
                    warn!(path = %path.display(), error = ?e, "cannot load DEM image, using fallback slope");
                    None
                }
            })
            .clone()
    }
}

fn bounds_key(b: DemBounds) -> [u64; 4] {
    [b.min_lat.to_bits(), b.max_lat.to_bits(), b.min_lon.to_bits(), b.max_lon.to_bits()]
}

/// Decode an image file from disk into 8-bit grayscale.
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let s = path.to_string_lossy();
    if s.starts_with("http://") || s.starts_with("https://") {
        bail!("remote DEM images are not fetched; download {s} first");
    }
    let img = image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(img.to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_no_grid_and_is_cached() {
        let mut cache = DemCache::new(3000.0);
        let p = Path::new("/nonexistent/rockfall/dem.png");
        assert!(cache.grid(p, None).is_none());
        assert!(cache.images.contains_key(p));
        assert!(cache.grid(p, None).is_none());
    }

    #[test]
    fn urls_are_rejected() {
        assert!(load_grayscale(Path::new("https://example.com/dem.png")).is_err());
    }

    #[test]
    fn decoded_png_becomes_scaled_grid() {
        let dir = std::env::temp_dir().join(format!("rockfall-dem-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ramp.png");
        let img = GrayImage::from_fn(4, 3, |x, _y| image::Luma([(x * 85) as u8]));
        img.save(&path).unwrap();

        let mut cache = DemCache::new(3000.0);
        let bounds = DemBounds::new(37.63, 38.16, 119.17, 119.90).unwrap();
        let grid = cache.grid(&path, Some(bounds)).unwrap();
        assert_eq!((grid.width(), grid.height()), (4, 3));
        assert!((grid.get(0, 3) - 3000.0).abs() < 1e-3);
        assert!((grid.get(2, 1) - 1000.0).abs() < 1e-3);
        assert!(grid.bounds().is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
