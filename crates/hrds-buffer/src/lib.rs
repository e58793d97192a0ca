//! # hrds-buffer
//!
//! Transition ("buffer") rasters for the hrds raster stack.
//!
//! A buffer shares its source raster's grid and holds, per cell, how far
//! the cell sits inside the source's valid data, scaled by a falloff
//! distance and capped at 1. The raster stack uses it as the blend weight
//! between a raster and the next one down.
//!
//! ```no_run
//! use hrds_buffer::{generate_buffer, BufferGenerator};
//!
//! // Straight to disk
//! generate_buffer("emod_utm.tif", 10_000.0, "emod_utm_buffer.tif")?;
//!
//! // Or in memory
//! let raster = hrds_raster::Raster::open("marine_digimap.tif")?;
//! let buffer = BufferGenerator::new(5_000.0)?.create(&raster)?;
//! # Ok::<(), hrds_buffer::BufferError>(())
//! ```

mod buffer;
mod distance;
mod error;

pub use buffer::{buffer_file_name, buffer_path_for, generate_buffer, BufferGenerator};
pub use error::BufferError;

/// Result type for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;
