use serde::{Deserialize, Serialize};

use crate::formats::LibraryItem;
use crate::reader::{DisplayMode, ReaderPreferences};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryQuery {
    #[serde(default)]
    pub hide_completed: bool,
    /// List one series' lessons instead of the root catalog.
    pub series: Option<String>,
}

/// A library item with the reader's progress on it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    #[serde(flatten)]
    pub item: LibraryItem,
    pub progress_percent: u32,
    pub completed: bool,
    pub last_read: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VisibilityRequest {
    pub index: usize,
    pub centered: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IndexRequest {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CompletionRequest {
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesView {
    pub mode: DisplayMode,
    pub font_size: u8,
    pub secondary_font_size: u8,
}

impl From<ReaderPreferences> for PreferencesView {
    fn from(prefs: ReaderPreferences) -> Self {
        Self {
            mode: prefs.mode,
            font_size: prefs.font_size.px(),
            secondary_font_size: prefs.font_size.secondary_px(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontAdjust {
    Increase,
    Decrease,
}

/// Absent fields keep their stored value; `adjust` applies after `fontSize`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub mode: Option<DisplayMode>,
    pub font_size: Option<u8>,
    pub adjust: Option<FontAdjust>,
}
