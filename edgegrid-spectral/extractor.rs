use edgegrid_core::{CellBounds, CellIndex, FeatureImage, Grid, LumaImage};
use rayon::prelude::*;
use tracing::debug;

use crate::config::SpectralConfig;
use crate::error::{SpectralError, SpectralResult};
use crate::fft::{fft_shift, FftPlans};
use crate::normalize::{magnitude_map, normalize_min_max};
use crate::preprocessing::Preprocessing;
use crate::types::{FeatureSource, Patch};

/// Builds the full-resolution feature image from per-cell spectra.
///
/// Each cell is a pure function of the input image and its index, so cells
/// are computed on a dedicated pool and written to disjoint regions.
pub struct SpectralExtractor {
    grid: Grid,
    cfg: SpectralConfig,
    plans: FftPlans,
    window: Option<Vec<f64>>,
    pool: rayon::ThreadPool,
}

impl SpectralExtractor {
    /// Creates a new extractor with validation
    pub fn new(grid: Grid, cfg: SpectralConfig) -> SpectralResult<Self> {
        cfg.validate()?;

        let c = grid.cell_size();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cfg.n_threads)
            .build()?;

        Ok(Self {
            grid,
            plans: FftPlans::for_lengths([c]),
            window: Preprocessing::window_coefficients(cfg.window, c, c),
            cfg,
            pool,
        })
    }

    fn validate_canvas(&self, img: &LumaImage) -> SpectralResult<()> {
        let s = self.grid.canvas_size();
        if img.len() != s * s {
            return Err(SpectralError::InvalidImageData {
                expected_len: s * s,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Normalized spectrum patch of one cell of a canvas-resolution image
    pub fn cell_patch(&self, img: &LumaImage, cell: CellIndex) -> SpectralResult<Patch> {
        self.validate_canvas(img)?;
        let c = self.grid.cell_size();
        let block = Preprocessing::extract_block(img, self.grid.canvas_size(), self.grid.bounds(cell));
        let data = self.spectrum_block(&self.plans, block, self.window.as_deref(), c, c)?;
        Ok(Patch { cell, data })
    }

    /// Feature image from the canvas-resolution luminance image
    pub fn extract(&self, img: &LumaImage) -> SpectralResult<FeatureImage> {
        self.validate_canvas(img)?;
        let cells: Vec<CellIndex> = self.grid.cells().collect();

        let patches: Vec<Patch> = self.pool.install(|| {
            cells
                .par_iter()
                .map(|&cell| self.cell_patch(img, cell))
                .collect::<SpectralResult<Vec<_>>>()
        })?;

        self.assemble(patches)
    }

    /// Feature image computed from the unscaled source.
    ///
    /// Cell `(i, j)` covers the proportional region
    /// `[i·W/N, (i+1)·W/N) × [j·H/N, (j+1)·H/N)` of the source; its spectrum is
    /// taken at native size and resampled to the cell size.
    pub fn extract_original(&self, img: &LumaImage, width: usize, height: usize) -> SpectralResult<FeatureImage> {
        let n = self.grid.cells_per_side();
        if width == 0 || height == 0 {
            return Err(SpectralError::InvalidImageSize { width, height });
        }
        if width < n || height < n {
            return Err(SpectralError::ImageTooSmall { width, height, min_size: n });
        }
        if img.len() != width * height {
            return Err(SpectralError::InvalidImageData {
                expected_len: width * height,
                actual_len: img.len(),
            });
        }

        let cells: Vec<CellIndex> = self.grid.cells().collect();
        let regions: Vec<CellBounds> = cells.iter().map(|&cell| source_region(cell, n, width, height)).collect();
        let plans = FftPlans::for_lengths(regions.iter().flat_map(|r| [r.width(), r.height()]));
        debug!(width, height, ?plans, "extracting from original");

        let c = self.grid.cell_size();
        let patches: Vec<Patch> = self.pool.install(|| {
            cells
                .par_iter()
                .zip(regions.par_iter())
                .map(|(&cell, &region)| {
                    let (w, h) = (region.width(), region.height());
                    let block = Preprocessing::extract_block(img, width, region);
                    let window = Preprocessing::window_coefficients(self.cfg.window, w, h);
                    let native = self.spectrum_block(&plans, block, window.as_deref(), w, h)?;
                    let data = Preprocessing::resample_block(&native, w, h, c, c);
                    Ok(Patch { cell, data })
                })
                .collect::<SpectralResult<Vec<_>>>()
        })?;

        self.assemble(patches)
    }

    /// Dispatch on the configured feature source
    pub fn extract_configured(&self, canvas: &LumaImage, original: &LumaImage, width: usize, height: usize) -> SpectralResult<FeatureImage> {
        match self.cfg.source {
            FeatureSource::Canvas => self.extract(canvas),
            FeatureSource::Original => self.extract_original(original, width, height),
        }
    }

    /// window → 2-D DFT → shift → magnitude → local min-max
    fn spectrum_block(
        &self,
        plans: &FftPlans,
        mut block: Vec<f64>,
        window: Option<&[f64]>,
        width: usize,
        height: usize,
    ) -> SpectralResult<Vec<u8>> {
        if let Some(w) = window {
            for (v, &k) in block.iter_mut().zip(w) {
                *v *= k;
            }
        }
        let spectrum = plans.forward_2d(&block, width, height)?;
        let shifted = fft_shift(&spectrum, width, height);
        let magnitudes = magnitude_map(&shifted, self.cfg.log_scale);
        Ok(normalize_min_max(&magnitudes))
    }

    fn assemble(&self, patches: Vec<Patch>) -> SpectralResult<FeatureImage> {
        let mut features = FeatureImage::new(self.grid.canvas_size());
        let mut flat = 0usize;
        for patch in &patches {
            if patch.is_flat() {
                flat += 1;
            }
            features.write_block(self.grid.bounds(patch.cell), &patch.data)?;
        }
        debug!(cells = patches.len(), flat, "assembled feature image");
        Ok(features)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Get extractor configuration
    pub fn config(&self) -> &SpectralConfig {
        &self.cfg
    }
}

/// Region of a `width`×`height` source image that maps onto `cell`
pub fn source_region(cell: CellIndex, cells_per_side: usize, width: usize, height: usize) -> CellBounds {
    let n = cells_per_side;
    CellBounds {
        x0: cell.i * width / n,
        x1: (cell.i + 1) * width / n,
        y0: cell.j * height / n,
        y1: (cell.j + 1) * height / n,
    }
}
