//! Error types for buffer generation.

use hrds_raster::RasterError;
use thiserror::Error;

/// Errors that can occur while creating a buffer raster.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Falloff distance must be a positive, finite number of map units.
    #[error("Invalid buffer distance {0} (must be finite and > 0)")]
    InvalidDistance(f64),

    /// Reading the source raster or writing the buffer failed.
    #[error(transparent)]
    Raster(#[from] RasterError),
}
