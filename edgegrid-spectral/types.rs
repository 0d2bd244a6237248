use edgegrid_core::CellIndex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Normalized C×C magnitude-spectrum block for one cell, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub cell: CellIndex,
    pub data: Vec<u8>,
}

impl Patch {
    /// True when the spectrum was flat and the block was zero-filled
    pub fn is_flat(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }
}

/// Taper applied to a cell block before the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowFunction {
    /// Raw block, no taper
    #[default]
    None,
    /// Separable Hann window, suppresses leakage from the cell border
    Hann,
}

/// Which pixels feed the per-cell transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FeatureSource {
    /// The canvas-resolution copy shown to the annotator
    #[default]
    Canvas,
    /// The unscaled decoded image; each cell covers the proportional region
    Original,
}
