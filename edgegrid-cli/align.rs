//! Orientation alignment between the label matrix and the feature image.
//!
//! Labels are produced cell-major (`[i][j]`, x band first) while the
//! feature image is written row-major in pixel space (`[y][x]`). The
//! persisted label grid uses image convention: row = y band, column = x
//! band. A vertical flip followed by three counter-clockwise quarter turns
//! is the same mapping as a plain transpose, which is what `align` applies.
//!
//! Each feature block keeps its spectrum as `(ky, kx)` = `(row, col)`, so a
//! texture varying only along x shows up on the block's centre row. Datasets
//! built with a per-cell `[x][y]` spectrum layout hold every block in
//! transposed form; block placement is the same in both.

use crate::{AnnotatorError, AnnotatorResult};
use edgegrid_core::{CellBounds, FeatureImage, Grid, LabelMatrix};

#[derive(Debug, Clone, Copy)]
pub struct OrientationAligner {
    grid: Grid,
}

impl OrientationAligner {
    pub fn new(grid: Grid) -> Self {
        Self { grid }
    }

    /// Bring both artifacts into image-row-major orientation.
    ///
    /// Label cell `(i, j)` lands at row `j`, column `i`. The feature image
    /// indexes pixels as `(y, x)` and passes through untouched; within each
    /// block the vertical axis is `ky`.
    pub fn align(&self, labels: LabelMatrix, features: FeatureImage) -> AnnotatorResult<AlignedOutputs> {
        let n = self.grid.cells_per_side();
        if labels.cells_per_side() != n {
            return Err(AnnotatorError::DimensionMismatch {
                what: "label matrix",
                expected: n,
                actual: labels.cells_per_side(),
            });
        }
        if features.size() != self.grid.canvas_size() {
            return Err(AnnotatorError::DimensionMismatch {
                what: "feature image",
                expected: self.grid.canvas_size(),
                actual: features.size(),
            });
        }

        Ok(AlignedOutputs {
            cells_per_side: n,
            cell_size: self.grid.cell_size(),
            label_rows: transpose(labels.as_raw(), n),
            features,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

/// Label grid and feature image sharing one orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedOutputs {
    cells_per_side: usize,
    cell_size: usize,
    label_rows: Vec<u8>,
    features: FeatureImage,
}

impl AlignedOutputs {
    pub fn cells_per_side(&self) -> usize {
        self.cells_per_side
    }

    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    /// Label at grid row `row` (y band) and column `col` (x band)
    pub fn label(&self, row: usize, col: usize) -> u8 {
        self.label_rows[row * self.cells_per_side + col]
    }

    pub fn label_rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.label_rows.chunks(self.cells_per_side)
    }

    pub fn label_data(&self) -> &[u8] {
        &self.label_rows
    }

    /// Label of the cell covering feature pixel `(x, y)`
    pub fn label_at_pixel(&self, x: usize, y: usize) -> u8 {
        self.label(y / self.cell_size, x / self.cell_size)
    }

    pub fn features(&self) -> &FeatureImage {
        &self.features
    }

    /// Feature pixels of the cell at grid row `row`, column `col`, row-major
    pub fn feature_block(&self, row: usize, col: usize) -> Vec<u8> {
        let c = self.cell_size;
        self.features.block(CellBounds {
            x0: col * c,
            x1: (col + 1) * c,
            y0: row * c,
            y1: (row + 1) * c,
        })
    }
}

/// `out[r][c] = m[c][r]` for a square `n x n` matrix
fn transpose(m: &[u8], n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n * n];
    for r in 0..n {
        for c in 0..n {
            out[r * n + c] = m[c * n + r];
        }
    }
    out
}
