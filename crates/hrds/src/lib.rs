//! # hrds
//!
//! Blend rasters of differing resolution and extent into one continuous
//! surface, without hard seams where one dataset's coverage ends.
//!
//! ## Overview
//!
//! A [`RasterStack`] holds a base raster covering the whole domain and a
//! priority-ordered list of refinement rasters, each paired with a buffer
//! raster that ramps from 0 at the raster's edge to 1 some distance inside.
//! A point query takes the highest-priority raster containing the point:
//! - buffer exactly 1: that raster's value is returned unchanged
//! - buffer below 1: its value is blended with the next raster down that
//!   contains the point (or the base), weighted by the buffer value
//!
//! Points outside every refinement raster come from the base.
//!
//! ## Example
//!
//! ```no_run
//! use hrds::{RasterStack, ValueRange};
//!
//! // Rasters are given lowest priority first
//! let mut bathy = RasterStack::builder("gebco_uk.tif")
//!     .rasters(["emod_utm.tif", "marine_digimap.tif"])
//!     .distances([10_000.0, 5_000.0])
//!     .minmax([
//!         ValueRange::new(None, Some(-5.0)),
//!         ValueRange::new(None, Some(-3.0)),
//!         ValueRange::unbounded(),
//!     ])
//!     .build()?;
//! bathy.set_bands(None)?;
//!
//! let depth = bathy.get_val((430_000.0, 5_620_000.0))?;
//! println!("Depth: {} m", depth);
//! # Ok::<(), hrds::StackError>(())
//! ```
//!
//! Stacks can also be described in YAML, see [`StackConfig`].

mod bands;
mod config;
mod error;
mod stack;

pub use bands::{BandSelection, LayerBands};
pub use config::{BaseConfig, LayerConfig, StackConfig};
pub use error::StackError;
pub use stack::{Layer, RasterStack, StackBuilder};

pub use hrds_raster::{Point, Raster, RasterBounds, ValueRange};

/// Result type for raster stack operations.
pub type Result<T> = std::result::Result<T, StackError>;
