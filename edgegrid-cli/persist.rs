use crate::align::AlignedOutputs;
use crate::config::LabelFormat;
use crate::{AnnotatorError, AnnotatorResult};
use image::GrayImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const IMAGES_DIR: &str = "images";
pub const LABELS_DIR: &str = "labels";

/// Where a committed record ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

/// Sink for aligned label/feature pairs.
///
/// A call either stores both artifacts under `id` or stores neither.
pub trait Persistence {
    fn persist(&mut self, id: &str, outputs: &AlignedOutputs) -> AnnotatorResult<PersistedRecord>;
}

/// Writes `<root>/images/<id>.png` and `<root>/labels/<id>.<ext>`
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    images_dir: PathBuf,
    labels_dir: PathBuf,
    format: LabelFormat,
}

impl DatasetWriter {
    pub fn new<P: AsRef<Path>>(root: P, format: LabelFormat) -> AnnotatorResult<Self> {
        let root = root.as_ref();
        let images_dir = root.join(IMAGES_DIR);
        let labels_dir = root.join(LABELS_DIR);
        std::fs::create_dir_all(&images_dir)?;
        std::fs::create_dir_all(&labels_dir)?;
        Ok(Self { images_dir, labels_dir, format })
    }

    pub fn image_path(&self, id: &str) -> PathBuf {
        self.images_dir.join(format!("{}.png", id))
    }

    pub fn label_path(&self, id: &str) -> PathBuf {
        self.labels_dir.join(format!("{}.{}", id, self.format.ext()))
    }

    pub fn format(&self) -> LabelFormat {
        self.format
    }

    fn write_temps(&self, outputs: &AlignedOutputs, image_tmp: &Path, label_tmp: &Path) -> AnnotatorResult<()> {
        let features = outputs.features();
        let size = features.size() as u32;
        let img = GrayImage::from_raw(size, size, features.as_raw().to_vec()).ok_or(
            AnnotatorError::DimensionMismatch {
                what: "feature buffer",
                expected: features.size() * features.size(),
                actual: features.as_raw().len(),
            },
        )?;
        img.save_with_format(image_tmp, image::ImageFormat::Png)?;

        match self.format {
            LabelFormat::Text => std::fs::write(label_tmp, encode_text_labels(outputs))?,
            LabelFormat::Json => std::fs::write(label_tmp, encode_json_labels(outputs)?)?,
            LabelFormat::Npy => ndarray_npy::write_npy(label_tmp, &label_array(outputs)?)?,
        }
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "failed to clean up partial output");
        }
    }
}

impl Persistence for DatasetWriter {
    fn persist(&mut self, id: &str, outputs: &AlignedOutputs) -> AnnotatorResult<PersistedRecord> {
        let image_path = self.image_path(id);
        let label_path = self.label_path(id);
        let image_tmp = temp_path(&image_path);
        let label_tmp = temp_path(&label_path);

        if let Err(e) = self.write_temps(outputs, &image_tmp, &label_tmp) {
            remove_quietly(&image_tmp);
            remove_quietly(&label_tmp);
            return Err(e);
        }

        if let Err(e) = std::fs::rename(&image_tmp, &image_path) {
            remove_quietly(&image_tmp);
            remove_quietly(&label_tmp);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&label_tmp, &label_path) {
            remove_quietly(&image_path);
            remove_quietly(&label_tmp);
            return Err(e.into());
        }

        debug!(id, image = %image_path.display(), label = %label_path.display(), "persisted record");
        Ok(PersistedRecord { image_path, label_path })
    }
}

/// `cells_per_side` lines, each with `cells_per_side` space-separated labels
pub fn encode_text_labels(outputs: &AlignedOutputs) -> String {
    let mut out = String::with_capacity(outputs.cells_per_side() * outputs.cells_per_side() * 2);
    for row in outputs.label_rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Row-major label grid, one inner vector per y band
pub fn decode_text_labels(text: &str) -> Vec<Vec<u8>> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.split_whitespace().filter_map(|t| t.parse().ok()).collect())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDocument {
    pub cells_per_side: usize,
    pub rows: Vec<Vec<u8>>,
}

impl LabelDocument {
    pub fn from_outputs(outputs: &AlignedOutputs) -> Self {
        Self {
            cells_per_side: outputs.cells_per_side(),
            rows: outputs.label_rows().map(|r| r.to_vec()).collect(),
        }
    }
}

pub fn encode_json_labels(outputs: &AlignedOutputs) -> AnnotatorResult<String> {
    Ok(serde_json::to_string(&LabelDocument::from_outputs(outputs))?)
}

/// Label grid as an `N x N` array, `[row][col]` = `[y band][x band]`
pub fn label_array(outputs: &AlignedOutputs) -> AnnotatorResult<Array2<i64>> {
    let n = outputs.cells_per_side();
    let data = outputs.label_data().iter().map(|&v| i64::from(v)).collect();
    Ok(Array2::from_shape_vec((n, n), data)?)
}
