use edgegrid_core::GridError;

#[derive(Debug, thiserror::Error)]
pub enum SpectralError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },
    #[error("Image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },
    #[error("Image {width}x{height} too small (minimum {min_size}x{min_size})")]
    ImageTooSmall { width: usize, height: usize, min_size: usize },
    #[error("Invalid thread count: {0} (must be > 0)")]
    InvalidThreadCount(usize),
    #[error("No FFT plan prepared for length {0}")]
    UnplannedLength(usize),
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
    #[cfg(feature = "serde")]
    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "serde")]
    #[error("TOML config error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type SpectralResult<T> = Result<T, SpectralError>;
