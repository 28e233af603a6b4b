use std::sync::Arc;

use serde::Serialize;

use crate::formats::{LessonDocument, ReadingProgress};
use crate::progress::{ProgressStore, record_percent};

pub trait Clock: Send + Sync {
    /// Epoch milliseconds.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Visibility notifications move the active segment.
    Watching,
    /// The user is scrubbing; visibility notifications are dropped.
    Seeking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub lesson_id: String,
    pub active_index: usize,
    pub total_segments: usize,
    pub mode: TrackingMode,
    pub completed: bool,
    pub progress_percent: u32,
}

/// Tracks the segment being read in one open lesson and persists it.
pub struct ReadingSession {
    lesson_id: String,
    segment_count: usize,
    active_index: usize,
    mode: TrackingMode,
    completed: bool,
    record: Option<ReadingProgress>,
    progress: ProgressStore,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ReadingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingSession")
            .field("lesson_id", &self.lesson_id)
            .field("segment_count", &self.segment_count)
            .field("active_index", &self.active_index)
            .field("mode", &self.mode)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl ReadingSession {
    /// Opens `lesson` and restores its saved position.
    pub fn open(lesson: &LessonDocument, progress: ProgressStore, clock: Arc<dyn Clock>) -> Self {
        let mut session = Self {
            lesson_id: lesson.id().to_owned(),
            segment_count: lesson.segment_count(),
            active_index: 0,
            mode: TrackingMode::Watching,
            completed: false,
            record: None,
            progress,
            clock,
        };
        session.load_progress();
        session
    }

    /// Adopts the stored record when its index fits this lesson; otherwise
    /// starts at the first segment, not completed.
    pub fn load_progress(&mut self) {
        self.active_index = 0;
        self.completed = false;
        self.record = None;

        let Some(record) = self.progress.get(&self.lesson_id) else {
            return;
        };
        if record.segment_index >= self.segment_count {
            tracing::debug!(
                lesson = %self.lesson_id,
                index = record.segment_index,
                segments = self.segment_count,
                "saved position out of range; starting at the beginning"
            );
            return;
        }
        self.active_index = record.segment_index;
        self.completed = record.completed;
        self.record = Some(record);
    }

    /// Event from the UI when a segment enters or leaves the centre band.
    pub fn notify_visibility_changed(&mut self, index: usize, is_centered: bool) -> bool {
        is_centered && self.on_segment_became_active(index)
    }

    /// Returns whether the position moved and was persisted.
    pub fn on_segment_became_active(&mut self, index: usize) -> bool {
        if self.mode == TrackingMode::Seeking || index >= self.segment_count {
            return false;
        }
        self.active_index = index;
        self.persist(self.completed);
        true
    }

    pub fn begin_seek(&mut self) {
        self.mode = TrackingMode::Seeking;
    }

    /// Live position update from a scrub control; persisted by [`Self::end_seek`].
    pub fn scrub_to(&mut self, index: usize) -> usize {
        if let Some(last) = self.segment_count.checked_sub(1) {
            self.active_index = index.min(last);
        }
        self.active_index
    }

    /// Leaves seeking and persists `final_index` whether or not a visibility
    /// event fired for it.
    pub fn end_seek(&mut self, final_index: usize) -> usize {
        self.mode = TrackingMode::Watching;
        let Some(last) = self.segment_count.checked_sub(1) else {
            return self.active_index;
        };
        self.active_index = final_index.min(last);
        self.persist(self.completed);
        self.active_index
    }

    /// Sets the completion flag without moving the position. A lesson
    /// without segments has no position to store, so nothing is persisted.
    pub fn toggle_completion(&mut self, completed: bool) {
        self.completed = completed;
        if self.segment_count == 0 {
            return;
        }
        self.persist(completed);
    }

    fn persist(&mut self, completed: bool) {
        let record = ReadingProgress {
            lesson_id: self.lesson_id.clone(),
            segment_index: self.active_index,
            last_read: self.clock.now_millis(),
            completed,
        };
        self.progress.put(&record);
        self.record = Some(record);
    }

    pub fn lesson_id(&self) -> &str {
        &self.lesson_id
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn progress_percent(&self) -> u32 {
        self.record
            .as_ref()
            .map_or(0, |record| record_percent(record, self.segment_count))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            lesson_id: self.lesson_id.clone(),
            active_index: self.active_index,
            total_segments: self.segment_count,
            mode: self.mode,
            completed: self.completed,
            progress_percent: self.progress_percent(),
        }
    }
}
