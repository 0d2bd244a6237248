//! Headless input surface: pointer events recorded as JSON and replayed
//! against an [`AnnotationSession`].

use crate::persist::Persistence;
use crate::render;
use crate::session::{AnnotationSession, CommitReport};
use crate::source::ImageSource;
use crate::{AnnotatorError, AnnotatorResult};
use edgegrid_core::Point;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PointerEvent {
    /// Pointer down
    Begin { x: i32, y: i32 },
    /// Drag to a new position
    Extend { x: i32, y: i32 },
    /// Pointer up
    End,
    /// Remove the last segment
    Undo,
    /// Remove the whole last stroke
    UndoStroke,
}

/// Events per image id; images without an entry are committed unannotated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeScript {
    pub images: BTreeMap<String, Vec<PointerEvent>>,
}

impl StrokeScript {
    pub fn load<P: AsRef<Path>>(path: P) -> AnnotatorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> AnnotatorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn events(&self, id: &str) -> &[PointerEvent] {
        self.images.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Check a scripted point against the accepted band around the canvas.
///
/// Off-canvas points are allowed up to one canvas width past each edge;
/// anything further is rejected before it reaches the rasterizer.
fn checked_point(x: i32, y: i32, canvas_size: usize) -> AnnotatorResult<Point> {
    let s = canvas_size as i64;
    let in_band = |v: i32| (-s..2 * s).contains(&i64::from(v));
    if in_band(x) && in_band(y) {
        Ok(Point::new(x, y))
    } else {
        Err(AnnotatorError::PointOutOfRange { x, y, canvas_size })
    }
}

pub fn apply_events<S: ImageSource, P: Persistence>(
    session: &mut AnnotationSession<S, P>,
    events: &[PointerEvent],
) -> AnnotatorResult<()> {
    let canvas_size = session.pipeline().grid().canvas_size();
    for event in events {
        match *event {
            PointerEvent::Begin { x, y } => session.begin_stroke(checked_point(x, y, canvas_size)?)?,
            PointerEvent::Extend { x, y } => {
                session.extend_stroke(checked_point(x, y, canvas_size)?)?;
            }
            PointerEvent::End => session.end_stroke()?,
            PointerEvent::Undo => {
                session.undo_last()?;
            }
            PointerEvent::UndoStroke => {
                session.undo_stroke()?;
            }
        }
    }
    Ok(())
}

/// Replay and commit every remaining image of the session.
///
/// With `preview_dir` set, `<id>_preview.png` is written for each image
/// just before its commit.
pub fn replay_all<S: ImageSource, P: Persistence>(
    session: &mut AnnotationSession<S, P>,
    script: &StrokeScript,
    preview_dir: Option<&Path>,
) -> AnnotatorResult<Vec<CommitReport>> {
    if let Some(dir) = preview_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut reports = Vec::new();
    let mut seen = BTreeSet::new();
    while let Some(id) = session.current().map(|r| r.id().to_string()) {
        let events = script.events(&id);
        debug!(id = %id, events = events.len(), "replaying strokes");
        apply_events(session, events)?;

        if let (Some(dir), Some(record)) = (preview_dir, session.current()) {
            let labels = session.current_labels();
            let img = render::preview(&record.image.canvas_rgb, session.pipeline().grid(), &record.history, labels.as_ref());
            img.save(dir.join(format!("{}_preview.png", id)))?;
        }

        reports.push(session.commit()?);
        seen.insert(id);
    }

    for id in script.images.keys().filter(|id| !seen.contains(*id)) {
        warn!(id = %id, "script entry matched no image");
    }
    let (done, total) = session.progress();
    info!(committed = reports.len(), done, total, "replay complete");
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelFormat;
    use crate::persist::{decode_text_labels, DatasetWriter};
    use crate::source::{DirectoryImageSource, InMemoryImageSource};
    use crate::CommitPipeline;
    use edgegrid_core::Grid;
    use edgegrid_spectral::SpectralConfig;
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

    const SCRIPT: &str = r#"{
        "images": {
            "first": [
                {"op": "begin", "x": 2, "y": 2},
                {"op": "extend", "x": 28, "y": 2},
                {"op": "extend", "x": 28, "y": 28},
                {"op": "undo"},
                {"op": "end"},
                {"op": "begin", "x": 50, "y": 50},
                {"op": "extend", "x": 55, "y": 55},
                {"op": "undo_stroke"}
            ],
            "missing": [{"op": "begin", "x": 0, "y": 0}]
        }
    }"#;

    #[test]
    fn test_parse_script() {
        let script = StrokeScript::from_json(SCRIPT).unwrap();
        assert_eq!(script.events("first").len(), 8);
        assert_eq!(script.events("first")[0], PointerEvent::Begin { x: 2, y: 2 });
        assert_eq!(script.events("first")[7], PointerEvent::UndoStroke);
        assert!(script.events("second").is_empty());
        assert!(StrokeScript::from_json(r#"{"images": {"a": [{"op": "jump"}]}}"#).is_err());
    }

    #[test]
    fn test_replay_all_writes_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let img = |v: u8| DynamicImage::ImageLuma8(GrayImage::from_fn(60, 60, |x, y| Luma([((x + y) as u8).wrapping_mul(v)])));
        let source = InMemoryImageSource::new(60).with_image("first", img(3)).with_image("second", img(5));
        let grid = Grid::new(60, 6).unwrap();
        let pipeline = CommitPipeline::new(grid, SpectralConfig { n_threads: 1, ..SpectralConfig::reference() }).unwrap();
        let writer = DatasetWriter::new(dir.path().join("out"), LabelFormat::Text).unwrap();
        let mut session = AnnotationSession::new(source, writer, pipeline);

        let previews = dir.path().join("previews");
        let script = StrokeScript::from_json(SCRIPT).unwrap();
        let reports = replay_all(&mut session, &script, Some(previews.as_path())).unwrap();

        assert_eq!(reports.len(), 2);
        assert!(session.is_done());
        // only the first horizontal segment survives: cells x 0..=2 in y band 0
        assert_eq!(reports[0].marked_cells, 3);
        assert_eq!(reports[1].marked_cells, 0);

        let text = std::fs::read_to_string(&reports[0].record.label_path).unwrap();
        let rows = decode_text_labels(&text);
        assert_eq!(rows[0], vec![1, 1, 1, 0, 0, 0]);
        assert!(rows[1..].iter().all(|r| r.iter().all(|&v| v == 0)));

        assert!(previews.join("first_preview.png").exists());
        assert!(previews.join("second_preview.png").exists());
        assert!(dir.path().join("out/images/second.png").exists());
    }

    #[test]
    fn test_far_off_canvas_points_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = InMemoryImageSource::new(60).with_image("only", DynamicImage::ImageLuma8(GrayImage::new(60, 60)));
        let pipeline = CommitPipeline::new(Grid::new(60, 6).unwrap(), SpectralConfig { n_threads: 1, ..SpectralConfig::reference() }).unwrap();
        let writer = DatasetWriter::new(dir.path(), LabelFormat::Text).unwrap();
        let mut session = AnnotationSession::new(source, writer, pipeline);

        // a little past the edge is fine
        let near = [PointerEvent::Begin { x: -10, y: 5 }, PointerEvent::Extend { x: 70, y: 5 }];
        apply_events(&mut session, &near).unwrap();
        let segments = session.current().unwrap().history.len();
        assert_eq!(segments, 1);

        let far = [PointerEvent::Extend { x: i32::MAX, y: 0 }];
        assert!(matches!(
            apply_events(&mut session, &far),
            Err(AnnotatorError::PointOutOfRange { x: i32::MAX, y: 0, canvas_size: 60 })
        ));
        let far_begin = [PointerEvent::Begin { x: 0, y: i32::MIN }];
        assert!(matches!(apply_events(&mut session, &far_begin), Err(AnnotatorError::PointOutOfRange { .. })));
        assert_eq!(session.current().unwrap().history.len(), segments);

        // the image is still open and commits with the accepted segment
        let report = session.commit().unwrap();
        assert_eq!(report.marked_cells, 6);
    }

    #[test]
    fn test_shared_stem_images_keep_separate_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        std::fs::create_dir(&input).unwrap();
        for name in ["cat.png", "cat.bmp"] {
            RgbImage::from_pixel(60, 60, Rgb([90, 90, 90])).save(input.join(name)).unwrap();
        }
        let exts: Vec<String> = ["png", "bmp"].iter().map(|s| s.to_string()).collect();
        let source = DirectoryImageSource::open(&input, &exts, 60).unwrap();
        let pipeline = CommitPipeline::new(Grid::new(60, 6).unwrap(), SpectralConfig { n_threads: 1, ..SpectralConfig::reference() }).unwrap();
        let writer = DatasetWriter::new(dir.path().join("out"), LabelFormat::Text).unwrap();
        let mut session = AnnotationSession::new(source, writer, pipeline);

        let script = StrokeScript::from_json(
            r#"{"images": {"cat_bmp": [{"op": "begin", "x": 2, "y": 2}, {"op": "extend", "x": 28, "y": 2}]}}"#,
        )
        .unwrap();
        let reports = replay_all(&mut session, &script, None).unwrap();

        assert_eq!(reports.len(), 2);
        assert_ne!(reports[0].record.label_path, reports[1].record.label_path);
        assert_ne!(reports[0].record.image_path, reports[1].record.image_path);
        assert_eq!(std::fs::read_dir(dir.path().join("out/labels")).unwrap().count(), 2);
        assert_eq!(std::fs::read_dir(dir.path().join("out/images")).unwrap().count(), 2);

        let marked = std::fs::read_to_string(dir.path().join("out/labels/cat_bmp.txt")).unwrap();
        assert_eq!(decode_text_labels(&marked)[0], vec![1, 1, 1, 0, 0, 0]);
        let blank = std::fs::read_to_string(dir.path().join("out/labels/cat_png.txt")).unwrap();
        assert!(decode_text_labels(&blank).iter().flatten().all(|&v| v == 0));
    }
}
