//! Buffer raster creation.

use crate::distance::squared_distance;
use crate::{BufferError, Result};
use hrds_raster::{write_geotiff, Raster};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Creates transition rasters that ramp from 0 at the edge of a raster's
/// valid data to 1 at `distance` map units inside it.
///
/// A cell is an edge when it lies on the outer ring of the grid or holds
/// no-data; every other cell takes `min(1, d / distance)` where `d` is the
/// Euclidean distance from its centre to the nearest edge cell centre.
/// The buffer keeps the source grid, so its coverage equals the source's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferGenerator {
    distance: f64,
}

impl BufferGenerator {
    /// Create a generator with the given falloff distance (in map units).
    pub fn new(distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(BufferError::InvalidDistance(distance));
        }
        Ok(Self { distance })
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Build the buffer for the active band of `raster`.
    pub fn create(&self, raster: &Raster) -> Result<Raster> {
        let (width, height) = raster.dimensions();
        let (w, h) = (width as usize, height as usize);
        let (dx, dy) = raster.resolution();

        let valid: Vec<bool> = raster
            .band_data()
            .iter()
            .map(|&v| !raster.is_no_data(v))
            .collect();
        let seeds: Vec<bool> = valid
            .iter()
            .enumerate()
            .map(|(i, &ok)| {
                let (x, y) = (i % w, i / w);
                !ok || x == 0 || y == 0 || x == w - 1 || y == h - 1
            })
            .collect();

        let dist2 = squared_distance(&seeds, w, h, dx, dy);
        let data: Vec<f32> = dist2
            .iter()
            .zip(&valid)
            .map(|(&d2, &ok)| {
                if ok {
                    (d2.sqrt() / self.distance).min(1.0) as f32
                } else {
                    0.0
                }
            })
            .collect();

        let full = data.iter().filter(|&&v| v == 1.0).count();
        debug!(
            width,
            height,
            distance = self.distance,
            full_cells = full,
            "created buffer"
        );

        Ok(Raster::from_data(data, width, height, raster.transform(), None)?)
    }

    /// Read `raster_path`, build its buffer and write it to `output_path`.
    pub fn write<P: AsRef<Path>, Q: AsRef<Path>>(&self, raster_path: P, output_path: Q) -> Result<()> {
        self.write_band(raster_path, None, output_path)
    }

    /// Like [`write`](Self::write), but the buffer follows the valid data
    /// of `band` (band 0 when `None`). The output always has one band.
    pub fn write_band<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        raster_path: P,
        band: Option<usize>,
        output_path: Q,
    ) -> Result<()> {
        let raster_path = raster_path.as_ref();
        let output_path = output_path.as_ref();
        info!(
            raster = %raster_path.display(),
            output = %output_path.display(),
            band = band.unwrap_or(0),
            distance = self.distance,
            "generating buffer"
        );

        let mut raster = Raster::open(raster_path)?;
        raster.select_band(band)?;
        let buffer = self.create(&raster)?;
        let (width, height) = buffer.dimensions();
        write_geotiff(
            output_path,
            buffer.band_data(),
            width,
            height,
            buffer.transform(),
            None,
        )?;
        Ok(())
    }
}

/// Write a buffer raster for `raster_path` with the given falloff distance.
pub fn generate_buffer<P: AsRef<Path>, Q: AsRef<Path>>(
    raster_path: P,
    distance: f64,
    output_path: Q,
) -> Result<()> {
    BufferGenerator::new(distance)?.write(raster_path, output_path)
}

/// File name used for a raster's buffer: `<stem>_buffer.<ext>`.
///
/// The extension defaults to `tif` when the raster has none.
pub fn buffer_file_name(raster_path: &Path) -> PathBuf {
    let stem = raster_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = raster_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tif".to_string());
    PathBuf::from(format!("{}_buffer.{}", stem, ext))
}

/// Path next to `raster_path` where its buffer is kept.
pub fn buffer_path_for(raster_path: &Path) -> PathBuf {
    raster_path.with_file_name(buffer_file_name(raster_path))
}
