//! Error types for the raster crate.

use crate::{Point, RasterBounds};
use thiserror::Error;

/// Errors that can occur when reading or sampling a raster.
#[derive(Debug, Error)]
pub enum RasterError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding or encoding error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - missing or malformed georeferencing tags.
    #[error("Invalid GeoTIFF {path}: {reason}")]
    InvalidGeoTiff {
        /// File being read.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Sample layout this reader does not handle.
    #[error("Unsupported raster layout: {0}")]
    UnsupportedLayout(String),

    /// Band data does not match the declared grid size.
    #[error("Invalid raster dimensions: {0}")]
    InvalidDimensions(String),

    /// Coordinate is outside the bounds of the raster.
    #[error("Coordinate ({}, {}) is outside raster bounds (x {}-{}, y {}-{})", point.x, point.y, bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y)]
    OutOfBounds {
        /// Requested point.
        point: Point,
        /// Extent of the raster.
        bounds: RasterBounds,
    },

    /// No-data value encountered while interpolating.
    #[error("No data at coordinate ({}, {})", point.x, point.y)]
    NoData {
        /// Requested point.
        point: Point,
    },

    /// Requested band does not exist.
    #[error("Band {band} out of range (raster has {count} bands)")]
    BandOutOfRange {
        /// Requested 0-based band index.
        band: usize,
        /// Number of bands in the raster.
        count: usize,
    },
}
