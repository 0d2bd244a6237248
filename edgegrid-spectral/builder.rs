use edgegrid_core::Grid;
use crate::config::SpectralConfig;
use crate::error::SpectralResult;
use crate::extractor::SpectralExtractor;
use crate::types::{FeatureSource, WindowFunction};

/// Builder for creating a `SpectralExtractor`
#[derive(Debug, Clone)]
pub struct ExtractorBuilder {
    grid: Grid,
    config: SpectralConfig,
}

impl ExtractorBuilder {
    /// Create a new builder with the default settings
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            config: SpectralConfig::reference(),
        }
    }

    /// Set the window applied before the transform
    pub fn window(mut self, window: WindowFunction) -> Self {
        self.config.window = window;
        self
    }

    /// Enable or disable `ln(1 + |X|)` compression
    pub fn log_scale(mut self, enable: bool) -> Self {
        self.config.log_scale = enable;
        self
    }

    /// Set which pixels feed the transform
    pub fn source(mut self, source: FeatureSource) -> Self {
        self.config.source = source;
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.n_threads = n_threads;
        self
    }

    /// Apply the windowed preset
    pub fn preset_windowed(mut self) -> Self {
        let preset = SpectralConfig::windowed();
        self.config.window = preset.window;
        self.config.log_scale = preset.log_scale;
        self
    }

    /// Apply the high-fidelity preset
    pub fn preset_high_fidelity(mut self) -> Self {
        self.config.source = SpectralConfig::high_fidelity().source;
        self
    }

    /// Build the `SpectralExtractor`
    pub fn build(self) -> SpectralResult<SpectralExtractor> {
        SpectralExtractor::new(self.grid, self.config)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        format!(
            "ExtractorBuilder: {}x{} canvas, {} cells/side, {}",
            self.grid.canvas_size(),
            self.grid.canvas_size(),
            self.grid.cells_per_side(),
            self.config.summary()
        )
    }

    /// Create a builder from an existing `SpectralConfig`
    pub fn from_config(grid: Grid, config: SpectralConfig) -> Self {
        Self { grid, config }
    }

    /// Convert the builder into a `SpectralConfig`
    pub fn to_config(self) -> SpectralConfig {
        self.config
    }
}
