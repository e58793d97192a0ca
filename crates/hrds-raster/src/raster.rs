//! In-memory raster loaded from a GeoTIFF file.

use crate::{GeoTransform, Point, RasterBounds, RasterError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

/// ModelPixelScaleTag.
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
/// ModelTiepointTag.
const TAG_MODEL_TIEPOINT: u16 = 33922;
/// ModelTransformationTag.
const TAG_MODEL_TRANSFORMATION: u16 = 34264;
/// GDAL_NODATA, stored as an ASCII string.
const TAG_GDAL_NODATA: u16 = 42113;

/// Resolve a GeoTIFF tag code to the decoder's tag value.
pub(crate) fn geo_tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Optional lower and upper clamp applied to every sampled value.
///
/// Useful for ocean models that need a minimum depth to prevent drying:
/// `ValueRange { min: None, max: Some(-5.0) }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// No clamping on either side.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn apply(&self, value: f64) -> f64 {
        let mut value = value;
        if let Some(min) = self.min {
            value = value.max(min);
        }
        if let Some(max) = self.max {
            value = value.min(max);
        }
        value
    }
}

impl From<(Option<f64>, Option<f64>)> for ValueRange {
    fn from((min, max): (Option<f64>, Option<f64>)) -> Self {
        Self { min, max }
    }
}

/// A raster with every band decoded into memory.
///
/// Values are stored row-major, north to south, west to east. One band is
/// active at a time; [`Raster::sample`] reads from it.
#[derive(Debug, Clone)]
pub struct Raster {
    /// Cell values, one vector per band.
    bands: Vec<Vec<f32>>,
    /// Width of the raster in pixels.
    width: u32,
    /// Height of the raster in pixels.
    height: u32,
    /// Pixel to map mapping.
    transform: GeoTransform,
    /// No-data value (cells equal to this are treated as missing).
    no_data: Option<f64>,
    /// Active band (0-based).
    band: usize,
    /// Clamp applied to sampled values.
    range: ValueRange,
    /// File the raster was read from, if any.
    path: Option<PathBuf>,
}

impl Raster {
    /// Load a raster from a GeoTIFF file with no value clamping.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_range(path, ValueRange::unbounded())
    }

    /// Load a raster from a GeoTIFF file, clamping sampled values to `range`.
    pub fn open_with_range<P: AsRef<Path>>(path: P, range: ValueRange) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(std::io::BufReader::new(file))?;

        // Large bathymetry grids easily exceed the decoder's default limits
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let transform = Self::read_geotransform(&mut decoder, path)?;
        let no_data = Self::read_nodata_value(&mut decoder);

        let samples = decoder
            .get_tag_u32(Tag::SamplesPerPixel)
            .map(|s| s as usize)
            .unwrap_or(1)
            .max(1);
        if samples > 1 && decoder.get_tag_u32(Tag::PlanarConfiguration).unwrap_or(1) == 2 {
            return Err(RasterError::UnsupportedLayout(format!(
                "{}: planar band separation is not supported",
                path.display()
            )));
        }

        let interleaved = Self::decode_data(&mut decoder)?;
        let bands = deinterleave(interleaved, samples);

        let mut raster = Self::from_bands(bands, width, height, transform, no_data)?;
        raster.range = range;
        raster.path = Some(path.to_path_buf());
        Ok(raster)
    }

    /// Build a raster from in-memory band data.
    ///
    /// Every band must hold exactly `width * height` values.
    pub fn from_bands(
        bands: Vec<Vec<f32>>,
        width: u32,
        height: u32,
        transform: GeoTransform,
        no_data: Option<f64>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions(format!(
                "{}x{} raster has no cells",
                width, height
            )));
        }
        if bands.is_empty() {
            return Err(RasterError::InvalidDimensions(
                "raster has no bands".to_string(),
            ));
        }
        let cells = width as usize * height as usize;
        if let Some((i, band)) = bands.iter().enumerate().find(|(_, b)| b.len() != cells) {
            return Err(RasterError::InvalidDimensions(format!(
                "band {} has {} values, expected {} ({}x{})",
                i,
                band.len(),
                cells,
                width,
                height
            )));
        }
        if !(transform.pixel_width > 0.0 && transform.pixel_height > 0.0) {
            return Err(RasterError::InvalidDimensions(format!(
                "pixel size must be positive, got {}x{}",
                transform.pixel_width, transform.pixel_height
            )));
        }

        Ok(Self {
            bands,
            width,
            height,
            transform,
            no_data,
            band: 0,
            range: ValueRange::unbounded(),
            path: None,
        })
    }

    /// Build a single-band raster from in-memory data.
    pub fn from_data(
        data: Vec<f32>,
        width: u32,
        height: u32,
        transform: GeoTransform,
        no_data: Option<f64>,
    ) -> Result<Self> {
        Self::from_bands(vec![data], width, height, transform, no_data)
    }

    /// Read the geotransform from GeoTIFF tags.
    fn read_geotransform<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
        path: &Path,
    ) -> Result<GeoTransform> {
        let invalid = |reason: &str| RasterError::InvalidGeoTiff {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };

        let tiepoint = decoder.get_tag_f64_vec(geo_tag(TAG_MODEL_TIEPOINT));
        let pixel_scale = decoder.get_tag_f64_vec(geo_tag(TAG_MODEL_PIXEL_SCALE));

        if let (Ok(tiepoint), Ok(scale)) = (tiepoint, pixel_scale) {
            if tiepoint.len() >= 6 && scale.len() >= 2 {
                // Tiepoint format: [i, j, k, x, y, z], raster (i, j) sits at map (x, y)
                let (i, j) = (tiepoint[0], tiepoint[1]);
                let (tie_x, tie_y) = (tiepoint[3], tiepoint[4]);
                let (scale_x, scale_y) = (scale[0], scale[1].abs());

                return Ok(GeoTransform::new(
                    tie_x - i * scale_x,
                    tie_y + j * scale_y,
                    scale_x,
                    scale_y,
                ));
            }
            return Err(invalid("truncated ModelTiepoint/ModelPixelScale tags"));
        }

        // 4x4 row-major matrix: x = a*col + b*row + d, y = e*col + f*row + h
        if let Ok(m) = decoder.get_tag_f64_vec(geo_tag(TAG_MODEL_TRANSFORMATION)) {
            if m.len() < 16 {
                return Err(invalid("truncated ModelTransformation tag"));
            }
            if m[1] != 0.0 || m[4] != 0.0 {
                return Err(RasterError::UnsupportedLayout(format!(
                    "{}: rotated rasters are not supported",
                    path.display()
                )));
            }
            return Ok(GeoTransform::new(m[3], m[7], m[0], -m[5]));
        }

        Err(invalid("no ModelTiepoint/ModelPixelScale or ModelTransformation tags"))
    }

    /// Decode the image into `f32` samples.
    fn decode_data<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<Vec<f32>> {
        let result = decoder.read_image()?;

        match result {
            DecodingResult::F32(data) => Ok(data),
            DecodingResult::F64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        }
    }

    /// Try to read the no-data value from the GDAL_NODATA tag.
    fn read_nodata_value<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
        decoder
            .get_tag_ascii_string(geo_tag(TAG_GDAL_NODATA))
            .ok()
            .and_then(|s| s.trim_matches(char::from(0)).trim().parse().ok())
    }

    /// Select the band read by subsequent samples. `None` selects the first band.
    pub fn select_band(&mut self, band: Option<usize>) -> Result<()> {
        let band = band.unwrap_or(0);
        if band >= self.bands.len() {
            return Err(RasterError::BandOutOfRange {
                band,
                count: self.bands.len(),
            });
        }
        self.band = band;
        Ok(())
    }

    /// Check if a point lies within the raster's extent.
    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }

    /// Sample the active band at a point.
    ///
    /// Uses bilinear interpolation between the four nearest pixel centres;
    /// within half a pixel of the edge the nearest edge value is used. The
    /// value range is applied to the result.
    pub fn sample(&self, point: Point) -> Result<f64> {
        self.check_bounds(point)?;

        let (fx, fy) = self.transform.to_pixel_centre_space(point);
        let fx = fx.clamp(0.0, (self.width - 1) as f64);
        let fy = fy.clamp(0.0, (self.height - 1) as f64);

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;

        // Neighbours with zero weight are never read, so no-data there is harmless
        let row = |y: u32| -> Result<f64> {
            let left = self.cell(x0, y, point)?;
            if tx > 0.0 {
                let right = self.cell(x1, y, point)?;
                Ok(left + (right - left) * tx)
            } else {
                Ok(left)
            }
        };

        let top = row(y0)?;
        let value = if ty > 0.0 {
            let bottom = row(y1)?;
            top + (bottom - top) * ty
        } else {
            top
        };

        Ok(self.range.apply(value))
    }

    /// Sample the active band at a point using the nearest pixel.
    pub fn sample_nearest(&self, point: Point) -> Result<f64> {
        self.check_bounds(point)?;

        let (fx, fy) = self.transform.to_pixel_centre_space(point);
        let x = fx.round().clamp(0.0, (self.width - 1) as f64) as u32;
        let y = fy.round().clamp(0.0, (self.height - 1) as f64) as u32;

        Ok(self.range.apply(self.cell(x, y, point)?))
    }

    fn check_bounds(&self, point: Point) -> Result<()> {
        let bounds = self.bounds();
        if bounds.contains(point) {
            Ok(())
        } else {
            Err(RasterError::OutOfBounds { point, bounds })
        }
    }

    /// Value of the active band at a pixel, or `NoData` for missing cells.
    fn cell(&self, x: u32, y: u32, point: Point) -> Result<f64> {
        let value = self.value_at(x, y);
        if self.is_no_data(value) {
            return Err(RasterError::NoData { point });
        }
        Ok(value as f64)
    }

    /// Raw value of the active band at a pixel, without no-data checks.
    pub fn value_at(&self, x: u32, y: u32) -> f32 {
        self.bands[self.band][(y as usize) * (self.width as usize) + x as usize]
    }

    /// Whether a raw cell value marks missing data.
    pub fn is_no_data(&self, value: f32) -> bool {
        value.is_nan() || self.no_data.is_some_and(|nd| value == nd as f32)
    }

    /// Get the extent of this raster.
    pub fn bounds(&self) -> RasterBounds {
        self.transform.bounds(self.width, self.height)
    }

    /// Get the dimensions of this raster in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get the pixel size in map units (x, y).
    pub fn resolution(&self) -> (f64, f64) {
        (self.transform.pixel_width, self.transform.pixel_height)
    }

    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Index of the active band.
    pub fn band(&self) -> usize {
        self.band
    }

    /// Cell values of the active band.
    pub fn band_data(&self) -> &[f32] {
        &self.bands[self.band]
    }

    pub fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    pub fn value_range(&self) -> ValueRange {
        self.range
    }

    pub fn set_value_range(&mut self, range: ValueRange) {
        self.range = range;
    }

    /// File this raster was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Split chunky-interleaved samples into one vector per band.
fn deinterleave(data: Vec<f32>, samples: usize) -> Vec<Vec<f32>> {
    if samples == 1 {
        return vec![data];
    }
    let mut bands = vec![Vec::with_capacity(data.len() / samples); samples];
    for pixel in data.chunks_exact(samples) {
        for (band, value) in bands.iter_mut().zip(pixel) {
            band.push(*value);
        }
    }
    bands
}
