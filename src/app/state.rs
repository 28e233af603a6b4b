use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::library::LibrarySource;
use crate::progress::ProgressStore;
use crate::reader::PreferenceStore;
use crate::session::{Clock, ReadingSession};

pub const PROGRESS_ENV: &str = "ZENREADER_PROGRESS";

/// Progress file for the app: `ZENREADER_PROGRESS` when set and non-empty.
pub fn progress_path_from_env(default: &str) -> String {
    std::env::var(PROGRESS_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Clone)]
pub struct AppState {
    pub library: Arc<dyn LibrarySource>,
    pub progress: ProgressStore,
    pub preferences: PreferenceStore,
    pub clock: Arc<dyn Clock>,
    sessions: Arc<Mutex<HashMap<String, ReadingSession>>>,
}

impl AppState {
    pub fn new(
        library: Arc<dyn LibrarySource>,
        progress: ProgressStore,
        preferences: PreferenceStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            library,
            progress,
            preferences,
            clock,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Replaces any open session for the same lesson.
    pub fn insert_session(&self, session: ReadingSession) -> anyhow::Result<()> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow::anyhow!("session registry lock poisoned"))?;
        sessions.insert(session.lesson_id().to_owned(), session);
        Ok(())
    }

    /// Runs `f` on the open session for `lesson_id`; `Ok(None)` when there is none.
    pub fn with_session<T>(
        &self,
        lesson_id: &str,
        f: impl FnOnce(&mut ReadingSession) -> T,
    ) -> anyhow::Result<Option<T>> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow::anyhow!("session registry lock poisoned"))?;
        Ok(sessions.get_mut(lesson_id).map(f))
    }
}
