//! Priority raster stack with buffered blending between layers.

use crate::{BandSelection, Result, StackError};
use hrds_buffer::{buffer_file_name, buffer_path_for, BufferGenerator};
use hrds_raster::{Point, Raster, RasterBounds, RasterError, ValueRange};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// One refinement raster paired with its transition buffer.
#[derive(Debug)]
pub struct Layer {
    raster: Raster,
    buffer: Raster,
    /// Position in the builder's ascending priority input.
    input_index: usize,
}

impl Layer {
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn buffer(&self) -> &Raster {
        &self.buffer
    }

    /// Position of this layer in the lowest-priority-first input order.
    pub fn input_index(&self) -> usize {
        self.input_index
    }
}

/// A stack of rasters queried as one continuous surface.
///
/// The base raster covers the whole domain at the lowest priority. Each
/// refinement layer overrides everything below it where its buffer is 1,
/// and blends linearly with the next containing raster down where its
/// buffer falls between 0 and 1.
///
/// # Example
///
/// ```no_run
/// use hrds::RasterStack;
///
/// let mut bathy = RasterStack::builder("gebco_uk.tif")
///     .rasters(["emod_utm.tif", "marine_digimap.tif"])
///     .distances([10_000.0, 5_000.0])
///     .build()?;
/// bathy.set_bands(None)?;
///
/// let depth = bathy.get_val((100.0, 100.0))?;
/// # Ok::<(), hrds::StackError>(())
/// ```
#[derive(Debug)]
pub struct RasterStack {
    base: Raster,
    /// Highest priority first.
    layers: Vec<Layer>,
}

impl RasterStack {
    /// Start building a stack on top of the base raster at `base`.
    pub fn builder<P: Into<PathBuf>>(base: P) -> StackBuilder {
        StackBuilder::new(base)
    }

    /// Build a stack from rasters already in memory.
    ///
    /// `layers` holds `(raster, buffer)` pairs, lowest priority first.
    pub fn from_layers(base: Raster, layers: Vec<(Raster, Raster)>) -> Self {
        let mut layers: Vec<Layer> = layers
            .into_iter()
            .enumerate()
            .map(|(input_index, (raster, buffer))| Layer {
                raster,
                buffer,
                input_index,
            })
            .collect();
        layers.reverse();
        Self { base, layers }
    }

    /// Choose which band every raster and buffer reads from.
    ///
    /// `None` selects the first band everywhere. A selection is checked in
    /// full before any band changes.
    pub fn set_bands(&mut self, bands: Option<&BandSelection>) -> Result<()> {
        let first;
        let bands = match bands {
            Some(bands) => bands,
            None => {
                first = BandSelection::first(self.layers.len());
                &first
            }
        };

        if bands.layers.len() != self.layers.len() {
            return Err(StackError::BandCountMismatch {
                given: bands.entry_count(),
                expected: self.layers.len() + 1,
            });
        }

        check_band(&self.base, bands.base, || "base raster".to_string())?;
        for layer in &self.layers {
            let selected = bands.layers[layer.input_index];
            check_band(&layer.raster, selected.raster, || {
                format!("raster {}", layer.input_index)
            })?;
            check_band(&layer.buffer, selected.buffer, || {
                format!("buffer {}", layer.input_index)
            })?;
        }

        self.base
            .select_band(Some(bands.base))
            .map_err(|source| invalid_band("base raster", source))?;
        for layer in &mut self.layers {
            let selected = bands.layers[layer.input_index];
            layer
                .raster
                .select_band(Some(selected.raster))
                .map_err(|source| invalid_band("raster", source))?;
            layer
                .buffer
                .select_band(Some(selected.buffer))
                .map_err(|source| invalid_band("buffer", source))?;
        }
        Ok(())
    }

    /// Value of the stack at `point`.
    ///
    /// The highest-priority layer whose raster contains the point decides
    /// the result. If its buffer is exactly 1 its value is returned as is;
    /// otherwise it is blended with the next lower raster containing the
    /// point (the base if none does), weighted by the buffer value. Points
    /// outside every layer come straight from the base.
    pub fn get_val<P: Into<Point>>(&self, point: P) -> Result<f64> {
        let point = point.into();
        let query = |source: RasterError| StackError::Query { point, source };

        for (i, layer) in self.layers.iter().enumerate() {
            if !layer.raster.contains(point) {
                continue;
            }

            let weight = layer.buffer.sample(point).map_err(query)?;
            let value = layer.raster.sample(point).map_err(query)?;
            if weight == 1.0 {
                trace!(x = point.x, y = point.y, layer = layer.input_index, "inside layer");
                return Ok(value);
            }

            let lower = self.layers[i + 1..]
                .iter()
                .map(|l| &l.raster)
                .find(|r| r.contains(point))
                .unwrap_or(&self.base);
            let lower_value = lower.sample(point).map_err(query)?;
            trace!(
                x = point.x,
                y = point.y,
                layer = layer.input_index,
                weight,
                "blending layer"
            );
            return Ok(value * weight + lower_value * (1.0 - weight));
        }

        self.base.sample(point).map_err(query)
    }

    /// Values at many points, evaluated in parallel.
    ///
    /// Results are in the same order as `points`; each point fails or
    /// succeeds on its own.
    pub fn get_vals(&self, points: &[Point]) -> Vec<Result<f64>> {
        points.par_iter().map(|&p| self.get_val(p)).collect()
    }

    pub fn base(&self) -> &Raster {
        &self.base
    }

    /// Refinement layers, highest priority first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Extent covered by the base and every layer.
    pub fn bounds(&self) -> RasterBounds {
        self.layers
            .iter()
            .fold(self.base.bounds(), |acc, l| acc.union(&l.raster.bounds()))
    }
}

fn invalid_band(target: &str, source: RasterError) -> StackError {
    StackError::InvalidBand {
        target: target.to_string(),
        source,
    }
}

fn check_band(raster: &Raster, band: usize, target: impl FnOnce() -> String) -> Result<()> {
    if band >= raster.band_count() {
        return Err(StackError::InvalidBand {
            target: target(),
            source: RasterError::BandOutOfRange {
                band,
                count: raster.band_count(),
            },
        });
    }
    Ok(())
}

/// Collects the inputs for a [`RasterStack`] and loads them.
///
/// Rasters are given lowest priority first: the last raster wins where it
/// is fully inside its buffer. Supply either buffer distances, from which
/// buffers are generated, or ready-made buffer rasters, one per raster.
#[derive(Debug, Clone)]
pub struct StackBuilder {
    base: PathBuf,
    rasters: Vec<PathBuf>,
    distances: Option<Vec<f64>>,
    buffers: Option<Vec<PathBuf>>,
    minmax: Option<Vec<ValueRange>>,
    source_bands: Option<Vec<usize>>,
    save_buffers: bool,
    scratch_dir: Option<PathBuf>,
}

impl StackBuilder {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base: base.into(),
            rasters: Vec::new(),
            distances: None,
            buffers: None,
            minmax: None,
            source_bands: None,
            save_buffers: false,
            scratch_dir: None,
        }
    }

    /// Refinement rasters, lowest priority first.
    pub fn rasters<I, P>(mut self, rasters: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.rasters = rasters.into_iter().map(Into::into).collect();
        self
    }

    /// Falloff distance for each raster's generated buffer, in map units.
    pub fn distances<I: IntoIterator<Item = f64>>(mut self, distances: I) -> Self {
        self.distances = Some(distances.into_iter().collect());
        self
    }

    /// Pre-built buffer rasters, one per raster in the same order.
    ///
    /// Each buffer's extent must match or exceed its raster's.
    pub fn buffers<I, P>(mut self, buffers: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.buffers = Some(buffers.into_iter().map(Into::into).collect());
        self
    }

    /// Value clamps: the base first, then one per raster.
    pub fn minmax<I, R>(mut self, ranges: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ValueRange>,
    {
        self.minmax = Some(ranges.into_iter().map(Into::into).collect());
        self
    }

    /// Band of each raster that its generated buffer follows, in raster
    /// order. Band 0 is used when not given.
    pub fn source_bands<I: IntoIterator<Item = usize>>(mut self, bands: I) -> Self {
        self.source_bands = Some(bands.into_iter().collect());
        self
    }

    /// Create the temporary buffer directory inside `dir` rather than the
    /// system temp directory.
    pub fn scratch_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Keep generated buffers as `<raster-stem>_buffer.<ext>` next to each raster.
    pub fn save_buffers(mut self, save: bool) -> Self {
        self.save_buffers = save;
        self
    }

    /// Check that the inputs are consistent without touching any file.
    pub fn validate(&self) -> Result<()> {
        let rasters = self.rasters.len();
        match (&self.distances, &self.buffers) {
            (Some(_), Some(_)) => return Err(StackError::ConflictingBufferSources),
            (None, None) if rasters > 0 => {
                return Err(StackError::MissingBufferSource { rasters })
            }
            (Some(distances), None) if distances.len() != rasters => {
                return Err(StackError::DistanceCountMismatch {
                    rasters,
                    distances: distances.len(),
                })
            }
            (None, Some(buffers)) if buffers.len() != rasters => {
                return Err(StackError::BufferCountMismatch {
                    rasters,
                    buffers: buffers.len(),
                })
            }
            _ => {}
        }

        if let Some(bands) = &self.source_bands {
            if bands.len() != rasters {
                return Err(StackError::SourceBandCountMismatch {
                    rasters,
                    bands: bands.len(),
                });
            }
        }

        if let Some(minmax) = &self.minmax {
            if minmax.len() != rasters + 1 {
                return Err(StackError::MinMaxCountMismatch {
                    given: minmax.len(),
                    expected: rasters + 1,
                });
            }
        }
        Ok(())
    }

    /// Validate, then load every raster and buffer.
    pub fn build(self) -> Result<RasterStack> {
        self.validate()?;

        let range = |i: usize| {
            self.minmax
                .as_ref()
                .map(|m| m[i])
                .unwrap_or_default()
        };

        let base = load(&self.base, range(0))?;
        debug!(path = %self.base.display(), "loaded base raster");

        let mut rasters = Vec::with_capacity(self.rasters.len());
        for (i, path) in self.rasters.iter().enumerate() {
            rasters.push(load(path, range(i + 1))?);
            debug!(path = %path.display(), priority = i, "loaded raster");
        }

        let buffers = match (&self.distances, &self.buffers) {
            (Some(distances), _) => self.generate_buffers(distances)?,
            (None, Some(buffers)) => buffers
                .iter()
                .map(|path| load(path, ValueRange::unbounded()))
                .collect::<Result<Vec<_>>>()?,
            (None, None) => Vec::new(),
        };

        Ok(RasterStack::from_layers(
            base,
            rasters.into_iter().zip(buffers).collect(),
        ))
    }

    /// Generate one buffer per raster inside a temporary directory.
    ///
    /// The directory and everything in it is removed when this returns,
    /// whether or not every buffer was created.
    fn generate_buffers(&self, distances: &[f64]) -> Result<Vec<Raster>> {
        let mut scratch = tempfile::Builder::new();
        scratch.prefix("hrds-buffers");
        let tmp = match &self.scratch_dir {
            Some(dir) => scratch.tempdir_in(dir)?,
            None => scratch.tempdir()?,
        };
        let mut buffers = Vec::with_capacity(self.rasters.len());

        for (i, (path, &distance)) in self.rasters.iter().zip(distances).enumerate() {
            // Index prefix keeps rasters with the same stem apart
            let name = format!("{}_{}", i, buffer_file_name(path).display());
            let temp_path = tmp.path().join(name);
            let band = self.source_bands.as_ref().map(|b| b[i]);

            BufferGenerator::new(distance)
                .and_then(|generator| generator.write_band(path, band, &temp_path))
                .map_err(|source| StackError::Buffer {
                    path: path.clone(),
                    source,
                })?;
            buffers.push(load(&temp_path, ValueRange::unbounded())?);

            if self.save_buffers {
                let keep = buffer_path_for(path);
                std::fs::copy(&temp_path, &keep)?;
                info!(path = %keep.display(), "saved buffer");
            }
        }

        tmp.close()?;
        Ok(buffers)
    }
}

fn load(path: &Path, range: ValueRange) -> Result<Raster> {
    Raster::open_with_range(path, range).map_err(|source| StackError::Load {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hrds_raster::GeoTransform;

    /// Uniform single-band raster covering `[x0, x0 + size] x [y0, y0 + size]`.
    fn uniform(x0: f64, y0: f64, size: u32, value: f32) -> Raster {
        Raster::from_data(
            vec![value; (size * size) as usize],
            size,
            size,
            GeoTransform::new(x0, y0 + size as f64, 1.0, 1.0),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_outside_layers_uses_base() {
        let stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 100, 100.0),
            vec![(uniform(10.0, 10.0, 10, 50.0), uniform(10.0, 10.0, 10, 1.0))],
        );
        assert_eq!(stack.get_val((50.0, 50.0)).unwrap(), 100.0);
    }

    #[test]
    fn test_full_buffer_returns_layer_value() {
        let stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 100, 100.0),
            vec![(uniform(10.0, 10.0, 10, 50.0), uniform(10.0, 10.0, 10, 1.0))],
        );
        assert_eq!(stack.get_val((15.0, 15.0)).unwrap(), 50.0);
    }

    #[test]
    fn test_partial_buffer_blends_with_base() {
        let stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 100, 100.0),
            vec![(uniform(10.0, 10.0, 10, 50.0), uniform(10.0, 10.0, 10, 0.4))],
        );
        assert_relative_eq!(stack.get_val((15.0, 15.0)).unwrap(), 80.0, epsilon = 1e-5);
    }

    #[test]
    fn test_partial_buffer_blends_with_next_layer_only() {
        // top (w = 0.25, value 10) over middle (w = 0.5, value 20) over base 100
        let stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 100, 100.0),
            vec![
                (uniform(0.0, 0.0, 50, 20.0), uniform(0.0, 0.0, 50, 0.5)),
                (uniform(10.0, 10.0, 10, 10.0), uniform(10.0, 10.0, 10, 0.25)),
            ],
        );
        // Middle's own buffer plays no part
        assert_relative_eq!(
            stack.get_val((15.0, 15.0)).unwrap(),
            10.0 * 0.25 + 20.0 * 0.75,
            epsilon = 1e-5
        );
        // Only the middle layer contains this point
        assert_relative_eq!(
            stack.get_val((40.0, 40.0)).unwrap(),
            20.0 * 0.5 + 100.0 * 0.5,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_blend_skips_lower_layers_not_containing_point() {
        let stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 100, 100.0),
            vec![
                (uniform(0.0, 0.0, 50, 20.0), uniform(0.0, 0.0, 50, 1.0)),
                (uniform(60.0, 60.0, 10, 7.0), uniform(60.0, 60.0, 10, 1.0)),
                (uniform(10.0, 10.0, 10, 10.0), uniform(10.0, 10.0, 10, 0.5)),
            ],
        );
        assert_relative_eq!(stack.get_val((15.0, 15.0)).unwrap(), 15.0, epsilon = 1e-5);
    }

    #[test]
    fn test_priority_is_last_input_first() {
        let stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 100, 100.0),
            vec![
                (uniform(0.0, 0.0, 50, 1.0), uniform(0.0, 0.0, 50, 1.0)),
                (uniform(0.0, 0.0, 50, 2.0), uniform(0.0, 0.0, 50, 1.0)),
            ],
        );
        assert_eq!(stack.get_val((25.0, 25.0)).unwrap(), 2.0);
        assert_eq!(stack.layers()[0].input_index(), 1);
        assert_eq!(stack.layers()[1].input_index(), 0);
    }

    #[test]
    fn test_query_outside_everything_is_error() {
        let stack = RasterStack::from_layers(uniform(0.0, 0.0, 10, 1.0), Vec::new());
        let err = stack.get_val((20.0, 20.0)).unwrap_err();
        assert!(err.is_query());
        assert!(matches!(
            err,
            StackError::Query {
                source: RasterError::OutOfBounds { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_buffer_smaller_than_raster_is_query_error() {
        let stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 100, 100.0),
            vec![(uniform(10.0, 10.0, 10, 50.0), uniform(12.0, 12.0, 5, 1.0))],
        );
        assert!(stack.get_val((11.0, 11.0)).unwrap_err().is_query());
    }

    #[test]
    fn test_set_bands_maps_input_order() {
        let transform = GeoTransform::new(0.0, 10.0, 1.0, 1.0);
        let bands = |values: &[f32]| {
            Raster::from_bands(values.iter().map(|&v| vec![v; 100]).collect(), 10, 10, transform, None)
                .unwrap()
        };
        let mut stack = RasterStack::from_layers(
            bands(&[100.0, 200.0]),
            vec![
                (bands(&[1.0, 2.0]), bands(&[1.0, 0.5])),
                (bands(&[3.0, 4.0, 5.0]), bands(&[1.0, 1.0, 0.5])),
            ],
        );
        assert_eq!(stack.get_val((5.0, 5.0)).unwrap(), 3.0);

        // Top layer (input 1) switches to band 2 where its buffer is 0.5
        stack
            .set_bands(Some(&BandSelection::uniform(1, &[0, 2])))
            .unwrap();
        assert_relative_eq!(stack.get_val((5.0, 5.0)).unwrap(), 5.0 * 0.5 + 1.0 * 0.5);

        // Input 0 switches to band 1; top layer's buffer is back to 1
        stack
            .set_bands(Some(&BandSelection::uniform(0, &[1, 1])))
            .unwrap();
        assert_eq!(stack.get_val((5.0, 5.0)).unwrap(), 4.0);

        stack.set_bands(None).unwrap();
        assert_eq!(stack.get_val((5.0, 5.0)).unwrap(), 3.0);
    }

    #[test]
    fn test_set_bands_rejects_bad_selection_without_changes() {
        let mut stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 10, 1.0),
            vec![(uniform(0.0, 0.0, 10, 2.0), uniform(0.0, 0.0, 10, 1.0))],
        );

        let err = stack.set_bands(Some(&BandSelection::uniform(0, &[]))).unwrap_err();
        assert!(matches!(
            err,
            StackError::BandCountMismatch {
                given: 1,
                expected: 2
            }
        ));

        let err = stack.set_bands(Some(&BandSelection::uniform(0, &[1]))).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, StackError::InvalidBand { .. }));
        assert_eq!(stack.layers()[0].raster().band(), 0);
    }

    #[test]
    fn test_get_vals_preserves_order() {
        let stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 100, 100.0),
            vec![(uniform(10.0, 10.0, 10, 50.0), uniform(10.0, 10.0, 10, 1.0))],
        );
        let points = vec![
            Point::new(15.0, 15.0),
            Point::new(50.0, 50.0),
            Point::new(500.0, 500.0),
        ];
        let values = stack.get_vals(&points);
        assert_eq!(values.len(), 3);
        assert_eq!(*values[0].as_ref().unwrap(), 50.0);
        assert_eq!(*values[1].as_ref().unwrap(), 100.0);
        assert!(values[2].is_err());
    }

    #[test]
    fn test_bounds_union() {
        let stack = RasterStack::from_layers(
            uniform(0.0, 0.0, 10, 1.0),
            vec![(uniform(5.0, 5.0, 10, 2.0), uniform(5.0, 5.0, 10, 1.0))],
        );
        let b = stack.bounds();
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (0.0, 15.0, 0.0, 15.0));
    }

    #[test]
    fn test_validate_counts() {
        let err = RasterStack::builder("base.tif")
            .rasters(["a.tif", "b.tif"])
            .distances([10.0])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            StackError::DistanceCountMismatch {
                rasters: 2,
                distances: 1
            }
        ));

        let err = RasterStack::builder("base.tif")
            .rasters(["a.tif"])
            .buffers(["a_buf.tif", "b_buf.tif"])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            StackError::BufferCountMismatch {
                rasters: 1,
                buffers: 2
            }
        ));

        let err = RasterStack::builder("base.tif")
            .rasters(["a.tif"])
            .distances([10.0])
            .minmax([ValueRange::new(None, Some(-5.0))])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            StackError::MinMaxCountMismatch {
                given: 1,
                expected: 2
            }
        ));
        assert!(err.to_string().contains("You gave 1 and I expected 2"));
    }

    #[test]
    fn test_validate_source_band_count() {
        let err = RasterStack::builder("base.tif")
            .rasters(["a.tif", "b.tif"])
            .distances([10.0, 10.0])
            .source_bands([1])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            StackError::SourceBandCountMismatch {
                rasters: 2,
                bands: 1
            }
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validate_buffer_sources() {
        let err = RasterStack::builder("base.tif")
            .rasters(["a.tif"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, StackError::MissingBufferSource { rasters: 1 }));

        let err = RasterStack::builder("base.tif")
            .rasters(["a.tif"])
            .distances([1.0])
            .buffers(["a_buf.tif"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, StackError::ConflictingBufferSources));
        assert!(err.is_configuration());

        // Base only
        assert!(RasterStack::builder("base.tif").validate().is_ok());
    }

    #[test]
    fn test_build_fails_before_io_on_bad_counts() {
        // None of these files exist, so a Load error would mean I/O happened first
        let err = RasterStack::builder("missing/base.tif")
            .rasters(["missing/a.tif"])
            .distances([1.0, 2.0])
            .build()
            .unwrap_err();
        assert!(matches!(err, StackError::DistanceCountMismatch { .. }));
    }
}
