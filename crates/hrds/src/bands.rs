//! Band selection for every raster in a stack.

/// Bands read from one refinement raster and its buffer (0-based).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerBands {
    pub raster: usize,
    pub buffer: usize,
}

impl LayerBands {
    /// Read the same band from the raster and its buffer.
    pub fn same(band: usize) -> Self {
        Self {
            raster: band,
            buffer: band,
        }
    }
}

/// Band to read from the base raster and from each refinement layer.
///
/// `layers` is indexed in the order rasters were given to the stack
/// builder (lowest priority first), not in query order. Entry `i` applies
/// to the `i`-th raster passed to
/// [`StackBuilder::rasters`](crate::StackBuilder::rasters) and to its buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandSelection {
    pub base: usize,
    pub layers: Vec<LayerBands>,
}

impl BandSelection {
    pub fn new(base: usize, layers: Vec<LayerBands>) -> Self {
        Self { base, layers }
    }

    /// First band everywhere, for a stack with `layer_count` refinement rasters.
    pub fn first(layer_count: usize) -> Self {
        Self {
            base: 0,
            layers: vec![LayerBands::default(); layer_count],
        }
    }

    /// Use `layers[i]` for both raster `i` and buffer `i`.
    pub fn uniform(base: usize, layers: &[usize]) -> Self {
        Self {
            base,
            layers: layers.iter().map(|&b| LayerBands::same(b)).collect(),
        }
    }

    /// Number of entries including the base.
    pub fn entry_count(&self) -> usize {
        self.layers.len() + 1
    }
}
