use crate::{AnnotatorError, AnnotatorResult};
use edgegrid_core::LumaImage;
use edgegrid_spectral::Preprocessing;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One decoded image, at canvas resolution and as originally decoded
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub id: String,
    /// What the annotator draws on
    pub canvas_rgb: RgbImage,
    pub canvas_luma: LumaImage,
    pub original_luma: LumaImage,
    pub original_width: usize,
    pub original_height: usize,
}

impl SourceImage {
    /// Resize to `canvas_size`² (bilinear) and derive both luminance planes
    pub fn from_dynamic(id: impl Into<String>, img: DynamicImage, canvas_size: usize) -> AnnotatorResult<Self> {
        let original = img.to_rgb8();
        let (ow, oh) = (original.width() as usize, original.height() as usize);
        let s = canvas_size as u32;

        let canvas_rgb = if original.dimensions() == (s, s) {
            original.clone()
        } else {
            image::imageops::resize(&original, s, s, FilterType::Triangle)
        };

        let canvas_luma = Preprocessing::rgb_to_luma(canvas_rgb.as_raw(), canvas_size, canvas_size)?;
        let original_luma = Preprocessing::rgb_to_luma(original.as_raw(), ow, oh)?;

        Ok(Self {
            id: id.into(),
            canvas_rgb,
            canvas_luma,
            original_luma,
            original_width: ow,
            original_height: oh,
        })
    }
}

/// Ordered, finite collection of images to annotate
pub trait ImageSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable identifier used to name the persisted artifacts
    fn id(&self, index: usize) -> Option<&str>;

    fn load(&self, index: usize) -> AnnotatorResult<SourceImage>;
}

/// Image files of one directory, sorted by file name.
///
/// Ids are file stems. Files sharing a stem (`cat.png`, `cat.bmp`) get the
/// lowercased extension appended (`cat_png`, `cat_bmp`) so their artifacts
/// never overwrite each other; ids are compared case-insensitively.
#[derive(Debug, Clone)]
pub struct DirectoryImageSource {
    entries: Vec<(String, PathBuf)>,
    canvas_size: usize,
}

impl DirectoryImageSource {
    pub fn open<P: AsRef<Path>>(dir: P, extensions: &[String], canvas_size: usize) -> AnnotatorResult<Self> {
        let dir = dir.as_ref();
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !has_extension(&path, extensions) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                entries.push((stem.to_string(), path.clone()));
            }
        }
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        disambiguate_ids(&mut entries)?;
        info!(dir = %dir.display(), images = entries.len(), "opened image directory");
        Ok(Self { entries, canvas_size })
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.entries.get(index).map(|(_, p)| p.as_path())
    }
}

fn disambiguate_ids(entries: &mut [(String, PathBuf)]) -> AnnotatorResult<()> {
    let mut stems: BTreeMap<String, usize> = BTreeMap::new();
    for (stem, _) in entries.iter() {
        *stems.entry(stem.to_lowercase()).or_default() += 1;
    }

    for (id, path) in entries.iter_mut() {
        if stems.get(&id.to_lowercase()).copied().unwrap_or(0) < 2 {
            continue;
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
        let unique = format!("{}_{}", id, ext);
        warn!(path = %path.display(), id = %unique, "file stem shared with another image");
        *id = unique;
    }

    let mut seen: BTreeMap<String, &Path> = BTreeMap::new();
    for (id, path) in entries.iter() {
        if let Some(first) = seen.insert(id.to_lowercase(), path.as_path()) {
            return Err(AnnotatorError::DuplicateImageId {
                id: id.clone(),
                first: first.to_path_buf(),
                second: path.clone(),
            });
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

impl ImageSource for DirectoryImageSource {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn id(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(id, _)| id.as_str())
    }

    fn load(&self, index: usize) -> AnnotatorResult<SourceImage> {
        let (id, path) = self
            .entries
            .get(index)
            .ok_or(AnnotatorError::IndexOutOfRange { index, len: self.entries.len() })?;
        debug!(path = %path.display(), "decoding image");
        let img = image::open(path)?;
        SourceImage::from_dynamic(id.clone(), img, self.canvas_size)
    }
}

/// Source over already-decoded images
#[derive(Debug, Clone, Default)]
pub struct InMemoryImageSource {
    images: Vec<(String, DynamicImage)>,
    canvas_size: usize,
}

impl InMemoryImageSource {
    pub fn new(canvas_size: usize) -> Self {
        Self { images: Vec::new(), canvas_size }
    }

    pub fn with_image(mut self, id: impl Into<String>, img: DynamicImage) -> Self {
        self.images.push((id.into(), img));
        self
    }
}

impl ImageSource for InMemoryImageSource {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn id(&self, index: usize) -> Option<&str> {
        self.images.get(index).map(|(id, _)| id.as_str())
    }

    fn load(&self, index: usize) -> AnnotatorResult<SourceImage> {
        let (id, img) = self
            .images
            .get(index)
            .ok_or(AnnotatorError::IndexOutOfRange { index, len: self.images.len() })?;
        SourceImage::from_dynamic(id.clone(), img.clone(), self.canvas_size)
    }
}
