//! Error types for the raster stack.

use hrds_buffer::BufferError;
use hrds_raster::{Point, RasterError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when building or querying a [`RasterStack`](crate::RasterStack).
///
/// Configuration errors are raised before any file is opened. Construction
/// errors wrap failures from reading rasters or generating buffers. Query
/// errors wrap the sampler failure at the requested point.
#[derive(Debug, Error)]
pub enum StackError {
    /// Number of buffer distances differs from the number of rasters.
    #[error("You have {rasters} rasters and {distances} distances. They should match")]
    DistanceCountMismatch { rasters: usize, distances: usize },

    /// Number of buffer rasters differs from the number of rasters.
    #[error("You have {rasters} rasters and {buffers} buffers. They should match")]
    BufferCountMismatch { rasters: usize, buffers: usize },

    /// Number of buffer source bands differs from the number of rasters.
    #[error("You have {rasters} rasters and {bands} buffer source bands. They should match")]
    SourceBandCountMismatch { rasters: usize, bands: usize },

    /// Min/max pairs must cover every raster plus the base.
    #[error("Supply one min/max pair per raster including the base. You gave {given} and I expected {expected}")]
    MinMaxCountMismatch { given: usize, expected: usize },

    /// Band selection must cover every raster plus the base.
    #[error("Supply one band per raster including the base. You gave {given} and I expected {expected}")]
    BandCountMismatch { given: usize, expected: usize },

    /// Rasters were given with neither distances nor buffers.
    #[error("{rasters} rasters were given without buffer distances or buffer rasters")]
    MissingBufferSource { rasters: usize },

    /// Both distances and buffers were given.
    #[error("Buffer distances and buffer rasters are mutually exclusive")]
    ConflictingBufferSources,

    /// A selected band does not exist in its raster.
    #[error("Invalid band for {target}: {source}")]
    InvalidBand { target: String, source: RasterError },

    /// Stack configuration file could not be parsed.
    #[error("Invalid stack configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A raster or buffer file could not be read.
    #[error("Failed to load raster {}: {source}", path.display())]
    Load { path: PathBuf, source: RasterError },

    /// Buffer generation failed for a raster.
    #[error("Failed to create buffer for {}: {source}", path.display())]
    Buffer { path: PathBuf, source: BufferError },

    /// Temporary directory or buffer copy failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The point could not be sampled.
    #[error("Query at ({}, {}) failed: {source}", point.x, point.y)]
    Query { point: Point, source: RasterError },
}

impl StackError {
    /// True for errors caused by inconsistent inputs rather than I/O or sampling.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StackError::DistanceCountMismatch { .. }
                | StackError::BufferCountMismatch { .. }
                | StackError::SourceBandCountMismatch { .. }
                | StackError::MinMaxCountMismatch { .. }
                | StackError::BandCountMismatch { .. }
                | StackError::MissingBufferSource { .. }
                | StackError::ConflictingBufferSources
                | StackError::InvalidBand { .. }
                | StackError::Yaml(_)
        )
    }

    /// True for failures raised while answering a point query.
    pub fn is_query(&self) -> bool {
        matches!(self, StackError::Query { .. })
    }
}
