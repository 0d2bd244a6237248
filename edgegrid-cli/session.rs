use crate::persist::{PersistedRecord, Persistence};
use crate::source::{ImageSource, SourceImage};
use crate::{AnnotatorError, AnnotatorResult, CommitPipeline};
use edgegrid_core::{LabelMatrix, Point, Segment};
use edgegrid_stroke::StrokeHistory;
use tracing::{debug, info, warn};

/// Where the session is in the per-image lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Between images
    Idle,
    /// Accepting stroke input for the current image
    Annotating,
    /// Labeling, feature extraction and alignment in progress
    Committing,
    /// Outputs handed to persistence, history about to be dropped
    Finalized,
    /// No images left
    Done,
}

/// Everything owned by the image currently being annotated
#[derive(Debug, Clone)]
pub struct ImageSession {
    pub index: usize,
    pub image: SourceImage,
    pub history: StrokeHistory,
}

impl ImageSession {
    pub fn new(index: usize, image: SourceImage) -> Self {
        Self { index, image, history: StrokeHistory::new() }
    }

    pub fn id(&self) -> &str {
        &self.image.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub id: String,
    pub index: usize,
    pub segments: usize,
    pub marked_cells: usize,
    pub record: PersistedRecord,
}

/// Drives one pass over an image source: strokes in, label/feature pairs out
pub struct AnnotationSession<S: ImageSource, P: Persistence> {
    source: S,
    sink: P,
    pipeline: CommitPipeline,
    state: SessionState,
    current: Option<ImageSession>,
    next_index: usize,
    committed: usize,
    skipped: usize,
    unreadable: usize,
}

impl<S: ImageSource, P: Persistence> AnnotationSession<S, P> {
    /// Opens the first readable image, or finishes at once when none remain
    pub fn new(source: S, sink: P, pipeline: CommitPipeline) -> Self {
        let mut session = Self {
            source,
            sink,
            pipeline,
            state: SessionState::Idle,
            current: None,
            next_index: 0,
            committed: 0,
            skipped: 0,
            unreadable: 0,
        };
        session.advance();
        session
    }

    fn advance(&mut self) {
        self.current = None;
        self.state = SessionState::Idle;

        while self.next_index < self.source.len() {
            let index = self.next_index;
            self.next_index += 1;
            match self.source.load(index) {
                Ok(image) => {
                    debug!(index, id = %image.id, "annotating image");
                    self.current = Some(ImageSession::new(index, image));
                    self.state = SessionState::Annotating;
                    return;
                }
                Err(e) => {
                    warn!(index, id = self.source.id(index).unwrap_or("?"), error = %e, "skipping unreadable image");
                    self.unreadable += 1;
                }
            }
        }

        info!(
            committed = self.committed,
            skipped = self.skipped,
            unreadable = self.unreadable,
            "annotation session finished"
        );
        self.state = SessionState::Done;
    }

    fn record_mut(&mut self) -> AnnotatorResult<&mut ImageSession> {
        match self.state {
            SessionState::Annotating => self.current.as_mut().ok_or(AnnotatorError::SessionFinished),
            _ => Err(AnnotatorError::SessionFinished),
        }
    }

    pub fn begin_stroke(&mut self, point: Point) -> AnnotatorResult<()> {
        self.record_mut()?.history.begin_stroke(point);
        Ok(())
    }

    /// Number of pixels the new segment covers, 0 when no stroke is active
    pub fn extend_stroke(&mut self, point: Point) -> AnnotatorResult<usize> {
        Ok(self.record_mut()?.history.extend_stroke(point).map(|p| p.len()).unwrap_or(0))
    }

    pub fn end_stroke(&mut self) -> AnnotatorResult<()> {
        self.record_mut()?.history.end_stroke();
        Ok(())
    }

    pub fn undo_last(&mut self) -> AnnotatorResult<Option<Segment>> {
        Ok(self.record_mut()?.history.undo_last())
    }

    pub fn undo_stroke(&mut self) -> AnnotatorResult<usize> {
        Ok(self.record_mut()?.history.undo_stroke())
    }

    /// Label, extract, align and persist the current image, then move on.
    ///
    /// On failure nothing is persisted and the image stays open with its
    /// strokes intact.
    pub fn commit(&mut self) -> AnnotatorResult<CommitReport> {
        self.record_mut()?;
        let record = self.current.take().ok_or(AnnotatorError::SessionFinished)?;

        self.state = SessionState::Committing;
        let result = self
            .pipeline
            .commit(&record)
            .and_then(|outputs| {
                let marked = outputs.label_data().iter().filter(|&&v| v == 1).count();
                self.sink.persist(record.id(), &outputs).map(|persisted| (marked, persisted))
            });

        let (marked_cells, persisted) = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(id = record.id(), error = %e, "commit failed, image left open");
                self.current = Some(record);
                self.state = SessionState::Annotating;
                return Err(e);
            }
        };

        self.state = SessionState::Finalized;
        let report = CommitReport {
            id: record.id().to_string(),
            index: record.index,
            segments: record.history.len(),
            marked_cells,
            record: persisted,
        };
        info!(id = %report.id, segments = report.segments, marked_cells, "committed image");
        self.committed += 1;
        drop(record);

        self.advance();
        Ok(report)
    }

    /// Drop the current image without writing anything
    pub fn skip(&mut self) -> AnnotatorResult<()> {
        let id = self.record_mut()?.id().to_string();
        debug!(id = %id, "skipped image");
        self.skipped += 1;
        self.advance();
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }

    /// `(images handled so far, total images)`
    pub fn progress(&self) -> (usize, usize) {
        (self.committed + self.skipped + self.unreadable, self.source.len())
    }

    pub fn committed(&self) -> usize {
        self.committed
    }

    pub fn current(&self) -> Option<&ImageSession> {
        self.current.as_ref()
    }

    /// Labels the current strokes would produce if committed now
    pub fn current_labels(&self) -> Option<LabelMatrix> {
        self.current.as_ref().map(|r| self.pipeline.labeler().label(&r.history))
    }

    pub fn pipeline(&self) -> &CommitPipeline {
        &self.pipeline
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }
}
