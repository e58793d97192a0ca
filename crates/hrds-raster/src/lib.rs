//! # hrds-raster
//!
//! GeoTIFF raster sampler used by the hrds raster stack.
//!
//! A [`Raster`] holds every band of a north-up GeoTIFF in memory and answers
//! point queries in the raster's native planar coordinates:
//! - [`Raster::contains`] tests a point against the pixel-edge extent
//! - [`Raster::sample`] interpolates bilinearly between pixel centres
//! - [`Raster::select_band`] chooses the band read by later samples
//! - an optional [`ValueRange`] clamps every sampled value
//!
//! [`write_geotiff`] writes single-band float rasters that [`Raster::open`]
//! reads back, which is how generated buffer rasters are persisted.
//!
//! ## Example
//!
//! ```no_run
//! use hrds_raster::{Point, Raster, ValueRange};
//!
//! let mut bathy = Raster::open_with_range("gebco_uk.tif", ValueRange::new(None, Some(-5.0)))?;
//! bathy.select_band(None)?;
//!
//! let p = Point::new(430_000.0, 5_620_000.0);
//! if bathy.contains(p) {
//!     println!("depth: {}", bathy.sample(p)?);
//! }
//! # Ok::<(), hrds_raster::RasterError>(())
//! ```

mod error;
mod geo;
mod raster;
mod writer;

pub use error::RasterError;
pub use geo::{GeoTransform, Point, RasterBounds};
pub use raster::{Raster, ValueRange};
pub use writer::write_geotiff;

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
