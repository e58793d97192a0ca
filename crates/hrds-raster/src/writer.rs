//! Single-band GeoTIFF output.

use crate::raster::geo_tag;
use crate::{GeoTransform, RasterError, Result};
use std::io::BufWriter;
use std::path::Path;
use tiff::encoder::{colortype, TiffEncoder};

const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GDAL_NODATA: u16 = 42113;

/// GeoKeyDirectory header (version 1.1.0, one key) followed by
/// GTRasterTypeGeoKey = RasterPixelIsArea.
const GEO_KEYS: [u16; 8] = [1, 1, 0, 1, 1025, 0, 1, 1];

/// Write a single-band 32-bit float GeoTIFF.
///
/// `data` is row-major, north to south. The file carries enough
/// georeferencing for [`Raster::open`](crate::Raster::open) to restore the
/// same grid.
pub fn write_geotiff<P: AsRef<Path>>(
    path: P,
    data: &[f32],
    width: u32,
    height: u32,
    transform: GeoTransform,
    no_data: Option<f64>,
) -> Result<()> {
    let expected = width as usize * height as usize;
    if data.len() != expected || expected == 0 {
        return Err(RasterError::InvalidDimensions(format!(
            "{} values for a {}x{} raster",
            data.len(),
            width,
            height
        )));
    }

    let file = std::fs::File::create(path.as_ref())?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    let mut image = encoder.new_image::<colortype::Gray32Float>(width, height)?;

    let scale = [transform.pixel_width, transform.pixel_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];
    let dir = image.encoder();
    dir.write_tag(geo_tag(TAG_MODEL_PIXEL_SCALE), &scale[..])?;
    dir.write_tag(geo_tag(TAG_MODEL_TIEPOINT), &tiepoint[..])?;
    dir.write_tag(geo_tag(TAG_GEO_KEY_DIRECTORY), &GEO_KEYS[..])?;
    if let Some(no_data) = no_data {
        dir.write_tag(geo_tag(TAG_GDAL_NODATA), no_data.to_string().as_str())?;
    }

    image.write_data(data)?;
    Ok(())
}
