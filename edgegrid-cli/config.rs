use crate::{AnnotatorError, AnnotatorResult};
use edgegrid_core::{Grid, DEFAULT_CANVAS_SIZE, DEFAULT_CELLS_PER_SIDE};
use edgegrid_spectral::SpectralConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk encoding of the aligned label grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LabelFormat {
    /// N lines of N space-separated `0`/`1`
    #[default]
    Text,
    /// `{"cells_per_side": N, "rows": [[..], ..]}`
    Json,
    /// NumPy `.npy`, an `N x N` int64 array
    Npy,
}

impl LabelFormat {
    pub fn ext(&self) -> &'static str {
        match self {
            LabelFormat::Text => "txt",
            LabelFormat::Json => "json",
            LabelFormat::Npy => "npy",
        }
    }
}

/// Annotator configuration, loadable from TOML or JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub canvas_size: usize,
    pub cells_per_side: usize,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub label_format: LabelFormat,
    /// Case-insensitive file extensions accepted by the directory source
    pub extensions: Vec<String>,
    pub spectral: SpectralConfig,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            cells_per_side: DEFAULT_CELLS_PER_SIDE,
            input_dir: PathBuf::from("images"),
            output_dir: PathBuf::from("tfds_storage"),
            label_format: LabelFormat::Text,
            extensions: ["png", "jpg", "jpeg", "bmp"].iter().map(|s| s.to_string()).collect(),
            spectral: SpectralConfig::reference(),
        }
    }
}

impl AnnotatorConfig {
    /// Check the grid partition and spectral settings, returning the grid
    pub fn validate(&self) -> AnnotatorResult<Grid> {
        let grid = Grid::new(self.canvas_size, self.cells_per_side)?;
        self.spectral.validate()?;
        Ok(grid)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}x{} canvas, {} cells/side, {} -> {} ({} labels), {}",
            self.canvas_size,
            self.canvas_size,
            self.cells_per_side,
            self.input_dir.display(),
            self.output_dir.display(),
            self.label_format.ext(),
            self.spectral.summary()
        )
    }

    /// Load from `.toml` or `.json`, chosen by extension, and validate
    pub fn load<P: AsRef<Path>>(path: P) -> AnnotatorResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let cfg: Self = match ConfigFormat::of(path)? {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> AnnotatorResult<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::of(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => self.to_toml()?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> AnnotatorResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn of(path: &Path) -> AnnotatorResult<Self> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "json" => Ok(ConfigFormat::Json),
            Some(ext) if ext == "toml" => Ok(ConfigFormat::Toml),
            _ => Err(AnnotatorError::UnsupportedConfigFormat { path: path.to_path_buf() }),
        }
    }
}
