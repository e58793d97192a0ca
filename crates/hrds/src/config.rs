//! YAML description of a raster stack.
//!
//! ```yaml
//! base: { path: gebco_uk.tif, max: -5.0 }
//! rasters:
//!   - { path: emod_utm.tif, distance: 10000.0, max: -3.0 }
//!   - { path: marine_digimap.tif, distance: 5000.0 }
//! save_buffers: false
//! ```
//!
//! Rasters are listed lowest priority first. Each entry gives either a
//! `distance` to generate its buffer from or a ready-made `buffer` file.

use crate::{BandSelection, LayerBands, RasterStack, Result, StackBuilder};
use hrds_raster::ValueRange;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The lowest-priority raster covering the whole domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// Band to read (0-based).
    #[serde(default)]
    pub band: Option<usize>,
}

/// One refinement raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub path: PathBuf,
    /// Falloff distance for a generated buffer, in map units.
    #[serde(default)]
    pub distance: Option<f64>,
    /// Pre-built buffer raster.
    #[serde(default)]
    pub buffer: Option<PathBuf>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub band: Option<usize>,
    /// Band of the buffer raster. Defaults to `band` for a `buffer` file
    /// and to 0 for a generated buffer, which has a single band.
    #[serde(default)]
    pub buffer_band: Option<usize>,
}

impl LayerConfig {
    fn range(&self) -> ValueRange {
        ValueRange::new(self.min, self.max)
    }
}

/// A complete raster stack description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    pub base: BaseConfig,
    #[serde(default)]
    pub rasters: Vec<LayerConfig>,
    /// Keep generated buffers next to their rasters.
    #[serde(default)]
    pub save_buffers: bool,
}

impl StackConfig {
    /// Parse a configuration from a YAML string. Paths are used as given.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file. Relative paths inside it are resolved
    /// against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&yaml)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        debug!(path = %path.display(), rasters = config.rasters.len(), "loaded stack config");
        Ok(config)
    }

    /// Make every relative path relative to `dir`.
    pub fn resolve_paths(&mut self, dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        resolve(&mut self.base.path);
        for layer in &mut self.rasters {
            resolve(&mut layer.path);
            if let Some(buffer) = layer.buffer.as_mut() {
                resolve(buffer);
            }
        }
    }

    /// Translate into builder inputs.
    ///
    /// Distances and buffers are collected from whichever entries carry
    /// them, so mixed or incomplete entries surface as the builder's count
    /// or conflict errors.
    pub fn builder(&self) -> StackBuilder {
        let mut builder = RasterStack::builder(&self.base.path)
            .rasters(self.rasters.iter().map(|l| l.path.clone()))
            .save_buffers(self.save_buffers);

        let distances: Vec<f64> = self.rasters.iter().filter_map(|l| l.distance).collect();
        let buffers: Vec<PathBuf> = self.rasters.iter().filter_map(|l| l.buffer.clone()).collect();
        if !distances.is_empty() {
            builder = builder.distances(distances);
        }
        if !buffers.is_empty() {
            builder = builder.buffers(buffers);
        }

        if self.rasters.iter().any(|l| l.band.is_some()) {
            builder = builder.source_bands(self.rasters.iter().map(|l| l.band.unwrap_or(0)));
        }

        let clamped = self.base.min.is_some()
            || self.base.max.is_some()
            || self.rasters.iter().any(|l| l.min.is_some() || l.max.is_some());
        if clamped {
            let ranges = std::iter::once(ValueRange::new(self.base.min, self.base.max))
                .chain(self.rasters.iter().map(LayerConfig::range));
            builder = builder.minmax(ranges);
        }
        builder
    }

    /// Band selection, if any entry asks for a band other than the default.
    pub fn bands(&self) -> Option<BandSelection> {
        let any = self.base.band.is_some()
            || self
                .rasters
                .iter()
                .any(|l| l.band.is_some() || l.buffer_band.is_some());
        if !any {
            return None;
        }
        Some(BandSelection::new(
            self.base.band.unwrap_or(0),
            self.rasters
                .iter()
                .map(|l| {
                    let raster = l.band.unwrap_or(0);
                    let generated = if l.distance.is_some() { 0 } else { raster };
                    LayerBands {
                        raster,
                        buffer: l.buffer_band.unwrap_or(generated),
                    }
                })
                .collect(),
        ))
    }

    /// Build the stack and apply the configured bands.
    pub fn build_stack(&self) -> Result<RasterStack> {
        let mut stack = self.builder().build()?;
        stack.set_bands(self.bands().as_ref())?;
        Ok(stack)
    }
}
