//! Per-cell spectral features: for every grid cell, the centered
//! log-magnitude 2-D spectrum of its pixels, min-max normalized within the
//! cell and written back into a canvas-sized feature image.

pub mod builder;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fft;
pub mod normalize;
pub mod preprocessing;
pub mod types;

pub use builder::ExtractorBuilder;
pub use config::SpectralConfig;
pub use error::{SpectralError, SpectralResult};
pub use extractor::{source_region, SpectralExtractor};
pub use preprocessing::Preprocessing;
pub use types::{FeatureSource, Patch, WindowFunction};
