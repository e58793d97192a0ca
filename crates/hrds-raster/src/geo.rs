//! Planar coordinates, extents and the pixel/map mapping.

use serde::{Deserialize, Serialize};

/// A planar coordinate in a raster's native coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Extent of a raster measured at the outer pixel edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterBounds {
    /// West edge.
    pub min_x: f64,
    /// East edge.
    pub max_x: f64,
    /// South edge.
    pub min_y: f64,
    /// North edge.
    pub max_y: f64,
}

impl RasterBounds {
    /// Check if a point is within the bounds (edges included).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Smallest extent covering both `self` and `other`.
    pub fn union(&self, other: &RasterBounds) -> RasterBounds {
        RasterBounds {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// North-up affine mapping between pixel indices and map coordinates.
///
/// Row 0 is the northern edge (`origin_y`), rows increase southward, columns
/// increase eastward from `origin_x`. Pixel sizes are always positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the top-left corner.
    pub origin_x: f64,
    /// Y coordinate of the top-left corner.
    pub origin_y: f64,
    /// Width of one pixel in map units.
    pub pixel_width: f64,
    /// Height of one pixel in map units.
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Extent of a `width` x `height` grid placed by this transform.
    pub fn bounds(&self, width: u32, height: u32) -> RasterBounds {
        RasterBounds {
            min_x: self.origin_x,
            max_x: self.origin_x + width as f64 * self.pixel_width,
            min_y: self.origin_y - height as f64 * self.pixel_height,
            max_y: self.origin_y,
        }
    }

    /// Fractional (column, row) position of a point relative to pixel centres.
    ///
    /// The centre of pixel (0, 0) maps to (0.0, 0.0).
    pub fn to_pixel_centre_space(&self, point: Point) -> (f64, f64) {
        (
            (point.x - self.origin_x) / self.pixel_width - 0.5,
            (self.origin_y - point.y) / self.pixel_height - 0.5,
        )
    }
}
