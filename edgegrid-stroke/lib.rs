//! Stroke capture for edge annotation: Bresenham rasterization, an exact
//! undo history of drawn segments, and the per-cell grid labeler.

pub mod history;
pub mod labeler;
pub mod raster;

pub use history::{SegmentEntry, StrokeHistory};
pub use labeler::GridLabeler;
pub use raster::{rasterize, rasterized_len};
