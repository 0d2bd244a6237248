use edgegrid_core::{Point, Segment};
use tracing::debug;

use crate::raster::rasterize;

/// A segment together with the pixels it was rasterized to when drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    pub segment: Segment,
    /// Identifier of the pointer-down gesture this segment belongs to
    pub stroke: u64,
    pub points: Vec<Point>,
}

/// Undoable, ordered record of every segment drawn on the current image.
///
/// The cached points are the single source of truth for labeling and for
/// redrawing; undo drops them as-is and never re-rasterizes.
#[derive(Debug, Clone, Default)]
pub struct StrokeHistory {
    entries: Vec<SegmentEntry>,
    anchor: Option<Point>,
    current_stroke: u64,
    next_stroke: u64,
}

impl StrokeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a freehand path at `point` without marking anything
    pub fn begin_stroke(&mut self, point: Point) {
        self.anchor = Some(point);
        self.current_stroke = self.next_stroke;
        self.next_stroke += 1;
        debug!(x = point.x, y = point.y, stroke = self.current_stroke, "begin stroke");
    }

    /// Extend the current path to `point`.
    ///
    /// Returns the newly cached pixels, or `None` when no stroke was begun.
    pub fn extend_stroke(&mut self, point: Point) -> Option<&[Point]> {
        let anchor = self.anchor?;
        let segment = Segment::new(anchor, point);
        let points = rasterize(segment);
        debug!(?segment, pixels = points.len(), "extend stroke");

        self.entries.push(SegmentEntry {
            segment,
            stroke: self.current_stroke,
            points,
        });
        self.anchor = Some(point);
        self.entries.last().map(|e| e.points.as_slice())
    }

    /// Pointer released: later drags need a new `begin_stroke`
    pub fn end_stroke(&mut self) {
        self.anchor = None;
    }

    /// Remove the most recent segment and exactly its cached points.
    /// The anchor is left where the pointer is.
    pub fn undo_last(&mut self) -> Option<Segment> {
        let entry = self.entries.pop()?;
        debug!(segment = ?entry.segment, remaining = self.entries.len(), "undo segment");
        Some(entry.segment)
    }

    /// Remove every segment of the most recent stroke; returns how many went
    pub fn undo_stroke(&mut self) -> usize {
        let Some(last) = self.entries.last().map(|e| e.stroke) else {
            return 0;
        };
        let keep = self
            .entries
            .iter()
            .rposition(|e| e.stroke != last)
            .map_or(0, |k| k + 1);
        let removed = self.entries.len() - keep;
        self.entries.truncate(keep);
        debug!(stroke = last, removed, "undo stroke");
        removed
    }

    /// Forget everything, including the anchor
    pub fn reset(&mut self) {
        self.entries.clear();
        self.anchor = None;
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SegmentEntry] {
        &self.entries
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.entries.iter().map(|e| &e.segment)
    }

    /// Concatenation of all cached points, in segment order
    pub fn marked_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.entries.iter().flat_map(|e| e.points.iter().copied())
    }

    pub fn point_count(&self) -> usize {
        self.entries.iter().map(|e| e.points.len()).sum()
    }
}
