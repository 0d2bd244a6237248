use edgegrid_core::{Grid, GridError};
use edgegrid_spectral::{SpectralConfig, SpectralError, SpectralExtractor};
use edgegrid_stroke::GridLabeler;
use std::path::PathBuf;
use tracing::info;

pub mod align;
pub mod config;
pub mod logging;
pub mod persist;
pub mod render;
pub mod replay;
pub mod session;
pub mod source;

pub use align::{AlignedOutputs, OrientationAligner};
pub use config::{AnnotatorConfig, LabelFormat};
pub use edgegrid_core::{self, CellIndex, FeatureImage, LabelMatrix, Point, Segment};
pub use persist::{DatasetWriter, Persistence};
pub use session::{AnnotationSession, CommitReport, ImageSession, SessionState};
pub use source::{DirectoryImageSource, ImageSource, InMemoryImageSource, SourceImage};

#[derive(Debug, thiserror::Error)]
pub enum AnnotatorError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
    #[error("Spectral error: {0}")]
    Spectral(#[from] SpectralError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("NPY write error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Unsupported config format: {} (expected .toml or .json)", path.display())]
    UnsupportedConfigFormat { path: PathBuf },
    #[error("{what} mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { what: &'static str, expected: usize, actual: usize },
    #[error("Image id {id:?} is shared by {} and {}", first.display(), second.display())]
    DuplicateImageId { id: String, first: PathBuf, second: PathBuf },
    #[error("Image index {index} out of range ({len} images)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Point ({x}, {y}) is too far outside the {canvas_size}x{canvas_size} canvas")]
    PointOutOfRange { x: i32, y: i32, canvas_size: usize },
    #[error("Annotation session is finished")]
    SessionFinished,
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type AnnotatorResult<T> = Result<T, AnnotatorError>;

/// Synchronous commit step: grid labeling, spectral features, alignment.
///
/// Both outputs are fully computed before anything is handed on, so a
/// failure here leaves nothing to clean up.
pub struct CommitPipeline {
    labeler: GridLabeler,
    extractor: SpectralExtractor,
    aligner: OrientationAligner,
}

impl CommitPipeline {
    pub fn new(grid: Grid, spectral: SpectralConfig) -> AnnotatorResult<Self> {
        let extractor = SpectralExtractor::new(grid, spectral)?;
        info!(
            canvas = grid.canvas_size(),
            cells = grid.cells_per_side(),
            cell_size = grid.cell_size(),
            "commit pipeline ready"
        );
        Ok(Self {
            labeler: GridLabeler::new(grid),
            extractor,
            aligner: OrientationAligner::new(grid),
        })
    }

    pub fn from_config(cfg: &AnnotatorConfig) -> AnnotatorResult<Self> {
        let grid = cfg.validate()?;
        Self::new(grid, cfg.spectral.clone())
    }

    /// Label matrix and feature image for one image record, aligned
    pub fn commit(&self, image: &ImageSession) -> AnnotatorResult<AlignedOutputs> {
        let labels = self.labeler.label(&image.history);
        let src = &image.image;
        let features = self.extractor.extract_configured(
            &src.canvas_luma,
            &src.original_luma,
            src.original_width,
            src.original_height,
        )?;
        self.aligner.align(labels, features)
    }

    pub fn labeler(&self) -> &GridLabeler {
        &self.labeler
    }

    pub fn extractor(&self) -> &SpectralExtractor {
        &self.extractor
    }

    pub fn grid(&self) -> &Grid {
        self.labeler.grid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgegrid_stroke::StrokeHistory;
    use image::{DynamicImage, RgbImage};

    fn pipeline(grid: Grid) -> CommitPipeline {
        let spectral = SpectralConfig { n_threads: 2, ..SpectralConfig::reference() };
        CommitPipeline::new(grid, spectral).unwrap()
    }

    /// Black canvas with a textured marker filling exactly one cell
    fn marker_image(grid: &Grid, cell: CellIndex) -> SourceImage {
        let s = grid.canvas_size() as u32;
        let b = grid.bounds(cell);
        let img = RgbImage::from_fn(s, s, |x, y| {
            let (x, y) = (x as usize, y as usize);
            if x >= b.x0 && x < b.x1 && y >= b.y0 && y < b.y1 {
                let v = (40 + (x * 13 + y * 7) % 200) as u8;
                image::Rgb([v, v, v])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        SourceImage::from_dynamic("marker", DynamicImage::ImageRgb8(img), grid.canvas_size()).unwrap()
    }

    #[test]
    fn test_marker_round_trip_alignment() {
        let grid = Grid::new(150, 10).unwrap();
        let pipeline = pipeline(grid);

        for &cell in &[CellIndex::new(2, 7), CellIndex::new(7, 2), CellIndex::new(0, 9)] {
            let b = grid.bounds(cell);
            let mut history = StrokeHistory::new();
            history.begin_stroke(Point::new(b.x0 as i32 + 2, b.y0 as i32 + 3));
            history.extend_stroke(Point::new(b.x1 as i32 - 2, b.y1 as i32 - 4));

            let record = ImageSession { index: 0, image: marker_image(&grid, cell), history };
            let out = pipeline.commit(&record).unwrap();

            // row = y band, column = x band
            assert_eq!(out.label(cell.j, cell.i), 1);
            assert_eq!(out.label_rows().map(|r| r.iter().filter(|&&v| v == 1).count()).sum::<usize>(), 1);

            // the only cell with spectral content is the marked one
            for other in grid.cells() {
                let block = out.feature_block(other.j, other.i);
                let has_content = block.iter().any(|&v| v != 0);
                assert_eq!(has_content, other == cell, "cell {:?}", other);
                assert_eq!(has_content, out.label(other.j, other.i) == 1);
            }

            // pixel lookup agrees on both artifacts
            let (px, py) = (b.x0 + 1, b.y0 + 1);
            assert_eq!(out.label_at_pixel(px, py), 1);
        }
    }

    #[test]
    fn test_single_segment_inside_one_cell() {
        let grid = Grid::reference();
        let pipeline = pipeline(grid);
        let mut history = StrokeHistory::new();
        history.begin_stroke(Point::new(152, 301));
        history.extend_stroke(Point::new(160, 311));

        let record = ImageSession {
            index: 0,
            image: marker_image(&grid, CellIndex::new(0, 0)),
            history,
        };
        let labels = pipeline.labeler().label(&record.history);
        assert_eq!(labels[(10, 20)], 1);
        assert_eq!(labels.count_marked(), 1);

        let out = pipeline.commit(&record).unwrap();
        assert_eq!(out.label(20, 10), 1);
        assert_eq!(out.label_rows().flatten().filter(|&&v| v == 1).count(), 1);
    }

    #[test]
    fn test_uneven_config_fails_fast() {
        let cfg = AnnotatorConfig { cells_per_side: 49, ..AnnotatorConfig::default() };
        let result = CommitPipeline::from_config(&cfg);
        assert!(matches!(result, Err(AnnotatorError::Grid(GridError::UnevenPartition { .. }))));
    }
}
