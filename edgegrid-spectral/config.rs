use edgegrid_core::default_thread_count;
use crate::error::{SpectralError, SpectralResult};
use crate::types::{FeatureSource, WindowFunction};

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Complete extractor configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpectralConfig {
    /// Taper applied to each block before the transform
    pub window: WindowFunction,
    /// Compress magnitudes with `ln(1 + |X|)`
    pub log_scale: bool,
    /// Pixels fed to the transform
    pub source: FeatureSource,
    /// Worker threads for per-cell extraction
    pub n_threads: usize,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self::reference()
    }
}

impl SpectralConfig {
    /// Raw block, log-magnitude, canvas pixels
    pub fn reference() -> Self {
        Self {
            window: WindowFunction::None,
            log_scale: true,
            source: FeatureSource::Canvas,
            n_threads: default_thread_count(),
            name: None,
            description: None,
        }
    }

    /// Hann-windowed blocks to damp the cross artifact from cell borders
    pub fn windowed() -> Self {
        Self {
            window: WindowFunction::Hann,
            name: Some("Windowed".to_string()),
            description: Some("Hann taper before the transform".to_string()),
            ..Self::reference()
        }
    }

    /// Transform the unscaled source pixels of each cell
    pub fn high_fidelity() -> Self {
        Self {
            source: FeatureSource::Original,
            name: Some("High fidelity".to_string()),
            description: Some("Per-cell spectra from the original, unscaled image".to_string()),
            ..Self::reference()
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "SpectralConfig: window={:?}, log_scale={}, source={:?}, threads={}",
            self.window, self.log_scale, self.source, self.n_threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> SpectralResult<()> {
        if self.n_threads == 0 {
            return Err(SpectralError::InvalidThreadCount(self.n_threads));
        }
        Ok(())
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> SpectralResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> SpectralResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
