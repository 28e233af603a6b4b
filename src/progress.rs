use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context as _;

use crate::formats::{LessonRef, LibraryItem, ReadingProgress, Series};
use crate::json_file::{read_json, write_json_atomic};

pub const PROGRESS_KEY_PREFIX: &str = "zenreader_progress_";

/// String-keyed persistence port for progress records.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// All keys in one JSON object file, rewritten atomically on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let entries = read_json(&self.path)
            .with_context(|| format!("read progress store: {}", self.path.display()))?;
        Ok(entries.unwrap_or_default())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("progress store lock poisoned"))?;
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(err) if err.chain().any(|cause| cause.is::<serde_json::Error>()) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = ?err,
                    "progress store is corrupt; starting fresh"
                );
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        entries.insert(key.to_owned(), value.to_owned());
        write_json_atomic(&self.path, &entries)
            .with_context(|| format!("write progress store: {}", self.path.display()))
    }
}

/// Typed progress records and the percentages derived from them.
///
/// Reads never fail: a missing, unreadable or corrupt record is treated as
/// absent. Writes are fire-and-forget and only logged on failure.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore").finish_non_exhaustive()
    }
}

impl ProgressStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn key(lesson_id: &str) -> String {
        format!("{PROGRESS_KEY_PREFIX}{lesson_id}")
    }

    pub fn get(&self, lesson_id: &str) -> Option<ReadingProgress> {
        let raw = match self.kv.get(&Self::key(lesson_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(lesson = %lesson_id, error = ?err, "failed to read progress");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(lesson = %lesson_id, %err, "ignoring corrupt progress record");
                None
            }
        }
    }

    pub fn put(&self, record: &ReadingProgress) {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(lesson = %record.lesson_id, %err, "failed to serialize progress");
                return;
            }
        };
        if let Err(err) = self.kv.set(&Self::key(&record.lesson_id), &json) {
            tracing::warn!(lesson = %record.lesson_id, error = ?err, "failed to save progress");
        }
    }

    /// 0..=100; 100 when completed, 0 without a record.
    pub fn lesson_percent(&self, lesson: &LessonRef) -> u32 {
        self.get(&lesson.id)
            .map_or(0, |record| record_percent(&record, lesson.total_segments))
    }

    /// Mean of the lesson percentages; 0 for an empty series.
    pub fn series_percent(&self, series: &Series) -> u32 {
        if series.books.is_empty() {
            return 0;
        }
        let total: u32 = series
            .books
            .iter()
            .map(|lesson| self.lesson_percent(lesson))
            .sum();
        (f64::from(total) / series.books.len() as f64).round() as u32
    }

    pub fn item_percent(&self, item: &LibraryItem) -> u32 {
        match item {
            LibraryItem::Book(lesson) => self.lesson_percent(lesson),
            LibraryItem::Series(series) => self.series_percent(series),
        }
    }

    pub fn is_lesson_completed(&self, lesson_id: &str) -> bool {
        self.get(lesson_id).is_some_and(|record| record.completed)
    }

    /// Vacuously true for an empty series.
    pub fn is_series_completed(&self, series: &Series) -> bool {
        series
            .books
            .iter()
            .all(|lesson| self.is_lesson_completed(&lesson.id))
    }

    pub fn is_item_completed(&self, item: &LibraryItem) -> bool {
        match item {
            LibraryItem::Book(lesson) => self.is_lesson_completed(&lesson.id),
            LibraryItem::Series(series) => self.is_series_completed(series),
        }
    }

    /// Sort key for "recently active first"; 0 when never read.
    pub fn most_recent_activity(&self, item: &LibraryItem) -> i64 {
        match item {
            LibraryItem::Book(lesson) => self.get(&lesson.id).map_or(0, |r| r.last_read),
            LibraryItem::Series(series) => series
                .books
                .iter()
                .filter_map(|lesson| self.get(&lesson.id))
                .map(|record| record.last_read)
                .max()
                .unwrap_or(0),
        }
    }

    /// Stable sort, most recently read first.
    pub fn sort_recent_first(&self, items: &mut [LibraryItem]) {
        items.sort_by_cached_key(|item| std::cmp::Reverse(self.most_recent_activity(item)));
    }

    /// The library as a list view shows it: recent first, optionally without
    /// completed entries.
    pub fn library_view(&self, items: &[LibraryItem], hide_completed: bool) -> Vec<LibraryItem> {
        let mut view = items.to_vec();
        self.sort_recent_first(&mut view);
        if hide_completed {
            view.retain(|item| !self.is_item_completed(item));
        }
        view
    }
}

pub(crate) fn record_percent(record: &ReadingProgress, total_segments: usize) -> u32 {
    if record.completed {
        return 100;
    }
    if total_segments == 0 {
        return 0;
    }
    let ratio = (record.segment_index + 1) as f64 / total_segments as f64;
    ((ratio * 100.0).round() as u32).min(100)
}
