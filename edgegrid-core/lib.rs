//! Core types shared by the edgegrid crates.
//!
//! Coordinates follow one convention everywhere: `x` grows to the right,
//! `y` grows downwards, and a cell index `(i, j)` names the `i`-th band
//! along `x` and the `j`-th band along `y`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default canvas edge length in pixels
pub const DEFAULT_CANVAS_SIZE: usize = 750;

/// Default number of grid cells along each side of the canvas
pub const DEFAULT_CELLS_PER_SIDE: usize = 50;

/// Row-major 8-bit grayscale image
pub type LumaImage = Vec<u8>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Invalid canvas size: {canvas_size} (must be > 0)")]
    InvalidCanvasSize { canvas_size: usize },
    #[error("Invalid cell count: {cells_per_side} (must be > 0)")]
    InvalidCellCount { cells_per_side: usize },
    #[error("Canvas size {canvas_size} is not divisible into {cells_per_side} cells per side")]
    UnevenPartition { canvas_size: usize, cells_per_side: usize },
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type GridResult<T> = Result<T, GridError>;

/// Integer pixel coordinate on the canvas.
///
/// Pointer events may land outside the canvas, so coordinates are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// One atomic, undoable straight line between two pointer positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Same segment drawn in the opposite direction
    pub const fn reversed(&self) -> Self {
        Self { start: self.end, end: self.start }
    }
}

/// Cell coordinate `(i, j)`: `i` counts cells along x, `j` along y
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellIndex {
    pub i: usize,
    pub j: usize,
}

impl CellIndex {
    pub const fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }
}

/// Half-open pixel bounds of a cell: `x0 <= x < x1`, `y0 <= y < y1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
}

impl CellBounds {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0
            && p.y >= 0
            && (p.x as usize) >= self.x0
            && (p.x as usize) < self.x1
            && (p.y as usize) >= self.y0
            && (p.y as usize) < self.y1
    }

    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }
}

/// Fixed N×N partition of a square S×S canvas into C×C cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    canvas_size: usize,
    cells_per_side: usize,
    cell_size: usize,
}

impl Grid {
    /// Creates a grid, rejecting any partition that would leave fractional cells
    pub fn new(canvas_size: usize, cells_per_side: usize) -> GridResult<Self> {
        if canvas_size == 0 {
            return Err(GridError::InvalidCanvasSize { canvas_size });
        }
        if cells_per_side == 0 {
            return Err(GridError::InvalidCellCount { cells_per_side });
        }
        if canvas_size % cells_per_side != 0 {
            return Err(GridError::UnevenPartition { canvas_size, cells_per_side });
        }

        Ok(Self {
            canvas_size,
            cells_per_side,
            cell_size: canvas_size / cells_per_side,
        })
    }

    /// 750×750 canvas split into 50×50 cells of 15 pixels
    pub fn reference() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            cells_per_side: DEFAULT_CELLS_PER_SIDE,
            cell_size: DEFAULT_CANVAS_SIZE / DEFAULT_CELLS_PER_SIDE,
        }
    }

    pub fn canvas_size(&self) -> usize {
        self.canvas_size
    }

    pub fn cells_per_side(&self) -> usize {
        self.cells_per_side
    }

    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.cells_per_side * self.cells_per_side
    }

    /// Cell containing `p`, or `None` when `p` lies outside the canvas
    pub fn cell_of(&self, p: Point) -> Option<CellIndex> {
        if p.x < 0 || p.y < 0 {
            return None;
        }
        let (x, y) = (p.x as usize, p.y as usize);
        if x >= self.canvas_size || y >= self.canvas_size {
            return None;
        }
        Some(CellIndex::new(x / self.cell_size, y / self.cell_size))
    }

    pub fn bounds(&self, cell: CellIndex) -> CellBounds {
        let c = self.cell_size;
        CellBounds {
            x0: cell.i * c,
            x1: (cell.i + 1) * c,
            y0: cell.j * c,
            y1: (cell.j + 1) * c,
        }
    }

    /// All cells, `i` outer and `j` inner
    pub fn cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        let n = self.cells_per_side;
        (0..n).flat_map(move |i| (0..n).map(move |j| CellIndex::new(i, j)))
    }

    /// Grid lines in pixel coordinates, including both canvas borders
    pub fn line_positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..=self.cells_per_side).map(move |k| k * self.cell_size)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::reference()
    }
}

/// Binary per-cell edge grid, indexed `[i][j]` by cell coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatrix {
    n: usize,
    cells: Vec<u8>,
}

impl LabelMatrix {
    pub fn zeros(cells_per_side: usize) -> Self {
        Self {
            n: cells_per_side,
            cells: vec![0; cells_per_side * cells_per_side],
        }
    }

    pub fn cells_per_side(&self) -> usize {
        self.n
    }

    pub fn get(&self, cell: CellIndex) -> u8 {
        self.cells[cell.i * self.n + cell.j]
    }

    pub fn mark(&mut self, cell: CellIndex) {
        self.cells[cell.i * self.n + cell.j] = 1;
    }

    pub fn is_marked(&self, cell: CellIndex) -> bool {
        self.get(cell) == 1
    }

    pub fn count_marked(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 1).count()
    }

    /// Cell-major storage: entry `i * n + j` holds cell `(i, j)`
    pub fn as_raw(&self) -> &[u8] {
        &self.cells
    }

    pub fn marked_cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        let n = self.n;
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 1)
            .map(move |(k, _)| CellIndex::new(k / n, k % n))
    }
}

impl std::ops::Index<(usize, usize)> for LabelMatrix {
    type Output = u8;

    fn index(&self, (i, j): (usize, usize)) -> &u8 {
        &self.cells[i * self.n + j]
    }
}

/// Full-resolution S×S feature image, stored row-major (`y * size + x`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureImage {
    size: usize,
    data: LumaImage,
}

impl FeatureImage {
    pub fn new(size: usize) -> Self {
        Self { size, data: vec![0; size * size] }
    }

    pub fn from_raw(size: usize, data: LumaImage) -> GridResult<Self> {
        if data.len() != size * size {
            return Err(GridError::DimensionMismatch {
                expected: size * size,
                actual: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.size + x]
    }

    /// Copies a row-major block into the region described by `bounds`
    pub fn write_block(&mut self, bounds: CellBounds, block: &[u8]) -> GridResult<()> {
        let w = bounds.width();
        if block.len() != w * bounds.height() {
            return Err(GridError::DimensionMismatch {
                expected: w * bounds.height(),
                actual: block.len(),
            });
        }
        for (row, y) in (bounds.y0..bounds.y1).enumerate() {
            let dst = y * self.size + bounds.x0;
            self.data[dst..dst + w].copy_from_slice(&block[row * w..(row + 1) * w]);
        }
        Ok(())
    }

    /// Row-major copy of the pixels inside `bounds`
    pub fn block(&self, bounds: CellBounds) -> Vec<u8> {
        let mut out = Vec::with_capacity(bounds.width() * bounds.height());
        for y in bounds.y0..bounds.y1 {
            let row = y * self.size;
            out.extend_from_slice(&self.data[row + bounds.x0..row + bounds.x1]);
        }
        out
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> LumaImage {
        self.data
    }
}

/// Worker count used when a configuration leaves it unset
pub fn default_thread_count() -> usize {
    num_cpus::get().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_grid() {
        let grid = Grid::reference();
        assert_eq!(grid.canvas_size(), 750);
        assert_eq!(grid.cells_per_side(), 50);
        assert_eq!(grid.cell_size(), 15);
        assert_eq!(grid.cell_count(), 2500);
        assert_eq!(Grid::new(750, 50).unwrap(), grid);
    }

    #[test]
    fn test_uneven_partition_rejected() {
        let result = Grid::new(750, 49);
        assert!(matches!(result, Err(GridError::UnevenPartition { canvas_size: 750, cells_per_side: 49 })));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(matches!(Grid::new(0, 50), Err(GridError::InvalidCanvasSize { .. })));
        assert!(matches!(Grid::new(750, 0), Err(GridError::InvalidCellCount { .. })));
    }

    #[test]
    fn test_boundary_point_belongs_to_higher_cell() {
        let grid = Grid::reference();
        assert_eq!(grid.cell_of(Point::new(14, 14)), Some(CellIndex::new(0, 0)));
        assert_eq!(grid.cell_of(Point::new(15, 14)), Some(CellIndex::new(1, 0)));
        assert_eq!(grid.cell_of(Point::new(14, 15)), Some(CellIndex::new(0, 1)));
        assert_eq!(grid.cell_of(Point::new(15, 15)), Some(CellIndex::new(1, 1)));
    }

    #[test]
    fn test_points_outside_canvas() {
        let grid = Grid::reference();
        assert_eq!(grid.cell_of(Point::new(-1, 10)), None);
        assert_eq!(grid.cell_of(Point::new(10, -1)), None);
        assert_eq!(grid.cell_of(Point::new(750, 10)), None);
        assert_eq!(grid.cell_of(Point::new(749, 749)), Some(CellIndex::new(49, 49)));
    }

    #[test]
    fn test_bounds_are_half_open_and_tile_the_canvas() {
        let grid = Grid::new(30, 3).unwrap();
        let mut hits = vec![0u32; 30 * 30];
        for cell in grid.cells() {
            let b = grid.bounds(cell);
            for y in b.y0..b.y1 {
                for x in b.x0..b.x1 {
                    hits[y * 30 + x] += 1;
                    assert_eq!(grid.cell_of(Point::new(x as i32, y as i32)), Some(cell));
                }
            }
        }
        assert!(hits.iter().all(|&h| h == 1));
    }

    #[test]
    fn test_label_matrix_indexing() {
        let mut labels = LabelMatrix::zeros(4);
        labels.mark(CellIndex::new(1, 3));
        assert_eq!(labels[(1, 3)], 1);
        assert_eq!(labels[(3, 1)], 0);
        assert_eq!(labels.count_marked(), 1);
        assert_eq!(labels.marked_cells().collect::<Vec<_>>(), vec![CellIndex::new(1, 3)]);
    }

    #[test]
    fn test_feature_image_blocks() {
        let grid = Grid::new(6, 2).unwrap();
        let mut img = FeatureImage::new(6);
        let bounds = grid.bounds(CellIndex::new(1, 0));
        let block: Vec<u8> = (0..9).collect();
        img.write_block(bounds, &block).unwrap();

        assert_eq!(img.pixel(3, 0), 0);
        assert_eq!(img.pixel(5, 0), 2);
        assert_eq!(img.pixel(3, 1), 3);
        assert_eq!(img.pixel(0, 0), 0);
        assert_eq!(img.block(bounds), block);

        let err = img.write_block(bounds, &[0; 4]);
        assert!(matches!(err, Err(GridError::DimensionMismatch { expected: 9, actual: 4 })));
    }

    #[test]
    fn test_feature_image_from_raw() {
        assert!(FeatureImage::from_raw(3, vec![0; 9]).is_ok());
        assert!(FeatureImage::from_raw(3, vec![0; 8]).is_err());
    }
}
