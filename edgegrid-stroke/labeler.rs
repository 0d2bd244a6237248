use edgegrid_core::{Grid, LabelMatrix, Point};

use crate::history::StrokeHistory;

/// Decides per grid cell whether any marked pixel falls inside it
#[derive(Debug, Clone, Copy)]
pub struct GridLabeler {
    grid: Grid,
}

impl GridLabeler {
    pub fn new(grid: Grid) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Label matrix for the history's current marked pixels
    pub fn label(&self, history: &StrokeHistory) -> LabelMatrix {
        self.label_points(history.marked_points())
    }

    /// Buckets every point straight into its cell; points off the canvas are ignored
    pub fn label_points<I>(&self, points: I) -> LabelMatrix
    where
        I: IntoIterator<Item = Point>,
    {
        let mut labels = LabelMatrix::zeros(self.grid.cells_per_side());
        for p in points {
            if let Some(cell) = self.grid.cell_of(p) {
                labels.mark(cell);
            }
        }
        labels
    }

    /// Cell-by-cell bounds scan. Quadratic, kept to cross-check `label_points`.
    pub fn label_points_scan(&self, points: &[Point]) -> LabelMatrix {
        let mut labels = LabelMatrix::zeros(self.grid.cells_per_side());
        for cell in self.grid.cells() {
            let bounds = self.grid.bounds(cell);
            if points.iter().any(|&p| bounds.contains(p)) {
                labels.mark(cell);
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgegrid_core::CellIndex;
    use proptest::prelude::*;

    #[test]
    fn test_empty_history_gives_zero_matrix() {
        let labeler = GridLabeler::new(Grid::reference());
        let labels = labeler.label(&StrokeHistory::new());
        assert_eq!(labels.count_marked(), 0);
        assert_eq!(labels.cells_per_side(), 50);
    }

    #[test]
    fn test_segment_inside_single_cell() {
        let labeler = GridLabeler::new(Grid::reference());
        let mut history = StrokeHistory::new();
        // cell (10, 20) spans x in [150, 165), y in [300, 315)
        history.begin_stroke(Point::new(151, 302));
        history.extend_stroke(Point::new(163, 312));

        let labels = labeler.label(&history);
        assert_eq!(labels[(10, 20)], 1);
        assert_eq!(labels.count_marked(), 1);
    }

    #[test]
    fn test_boundary_pixel_goes_to_higher_cell() {
        let labeler = GridLabeler::new(Grid::reference());
        let labels = labeler.label_points([Point::new(15, 30)]);
        assert!(labels.is_marked(CellIndex::new(1, 2)));
        assert!(!labels.is_marked(CellIndex::new(0, 1)));
        assert!(!labels.is_marked(CellIndex::new(0, 2)));
        assert!(!labels.is_marked(CellIndex::new(1, 1)));
    }

    #[test]
    fn test_off_canvas_points_ignored() {
        let labeler = GridLabeler::new(Grid::reference());
        let labels = labeler.label_points([Point::new(-1, 5), Point::new(750, 5), Point::new(5, 800)]);
        assert_eq!(labels.count_marked(), 0);
    }

    #[test]
    fn test_idempotent() {
        let labeler = GridLabeler::new(Grid::reference());
        let mut history = StrokeHistory::new();
        history.begin_stroke(Point::new(0, 0));
        history.extend_stroke(Point::new(749, 749));
        history.extend_stroke(Point::new(0, 749));

        let first = labeler.label(&history);
        let second = labeler.label(&history);
        assert_eq!(first, second);
        // diagonal touches every diagonal cell, bottom edge every bottom-row cell
        assert_eq!(first.count_marked(), 50 + 49);
    }

    #[test]
    fn test_undo_unmarks_cells() {
        let labeler = GridLabeler::new(Grid::reference());
        let mut history = StrokeHistory::new();
        history.begin_stroke(Point::new(5, 5));
        history.extend_stroke(Point::new(10, 5));
        history.extend_stroke(Point::new(40, 5));
        assert_eq!(labeler.label(&history).count_marked(), 3);

        history.undo_last();
        let labels = labeler.label(&history);
        assert_eq!(labels.count_marked(), 1);
        assert!(labels.is_marked(CellIndex::new(0, 0)));
    }

    proptest! {
        #[test]
        fn bucketed_matches_scan(points in prop::collection::vec((-20i32..170, -20i32..170), 0..60)) {
            let labeler = GridLabeler::new(Grid::new(150, 10).unwrap());
            let points: Vec<Point> = points.into_iter().map(Point::from).collect();
            prop_assert_eq!(labeler.label_points(points.iter().copied()), labeler.label_points_scan(&points));
        }
    }
}
